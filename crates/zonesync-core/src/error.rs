//! Error types for the zonesync system
//!
//! The variants follow the failure classes of a reconciliation run:
//! configuration, zone lookup, record validation, internal consistency
//! and transport.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zonesync system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing credentials, invalid policy)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one zone matched a lookup
    #[error("Found {count} zones matching {name}")]
    Ambiguous {
        /// Zone name that was looked up
        name: String,
        /// Number of matches
        count: usize,
    },

    /// A record cannot be sent to the provider as-is
    #[error("Invalid record {record}: {message}")]
    Validation {
        /// The offending record (label and type)
        record: String,
        /// What is wrong with it
        message: String,
    },

    /// Internal contract violation between diffing and correction compiling
    #[error("Internal inconsistency: {0}")]
    Consistency(String),

    /// A provider mutation failed; `code` is the raw status or result code
    #[error("Provider error ({provider}) ret={code:03}: {detail}")]
    Transport {
        /// Provider name
        provider: String,
        /// Raw status / result code returned by the provider
        code: u16,
        /// Raw response body or message
        detail: String,
    },

    /// HTTP client errors that never reached the provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an ambiguous-lookup error
    pub fn ambiguous(name: impl Into<String>, count: usize) -> Self {
        Self::Ambiguous {
            name: name.into(),
            count,
        }
    }

    /// Create a validation error attributed to one record
    pub fn validation(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a consistency error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create a transport error wrapping the provider's raw result
    pub fn transport(provider: impl Into<String>, code: u16, detail: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            code,
            detail: detail.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error was raised before any network call was made
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation { .. } | Self::Consistency(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_raw_code() {
        let err = Error::transport("gandi", 404, "{\"code\":404,\"message\":\"Unknown record\"}");
        let text = err.to_string();
        assert!(text.contains("ret=404"));
        assert!(text.contains("Unknown record"));
        assert!(!err.is_pre_flight());
    }

    #[test]
    fn validation_error_names_record() {
        let err = Error::validation("sip.tcp SRV", "label must match _service._protocol");
        assert!(err.to_string().contains("sip.tcp SRV"));
        assert!(err.is_pre_flight());
    }
}
