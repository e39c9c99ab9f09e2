//! Configuration types for the zonesync system
//!
//! A configuration file names one provider and the desired records of every
//! zone it manages. It is plain JSON:
//!
//! ```json
//! {
//!   "provider": { "type": "gandi", "token": "..." },
//!   "zones": [
//!     {
//!       "name": "example.com",
//!       "records": [
//!         { "name": "www", "type": "A", "target": "192.0.2.1", "ttl": 300 }
//!       ],
//!       "unmanaged": ["*.dyn"]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Record;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zones to reconcile
    pub zones: Vec<ZoneConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ZoneSyncConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(Error::config("No zones configured"));
        }

        for zone in &self.zones {
            zone.validate()?;
        }
        self.provider.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Gandi LiveDNS v5
    Gandi {
        /// Personal access token, sent as a bearer token
        #[serde(default)]
        token: String,
        /// Legacy API key, used when no token is set
        #[serde(default)]
        api_key: String,
        /// Organization to act for (optional)
        #[serde(default)]
        sharing_id: Option<String>,
        /// API base URL (optional, defaults to the public endpoint)
        #[serde(default)]
        api_url: Option<String>,
        /// Dump fetched record sets at debug level
        #[serde(default)]
        debug: bool,
    },

    /// SoftLayer DNS
    Softlayer {
        /// API user name
        #[serde(default)]
        username: String,
        /// API key
        #[serde(default)]
        api_key: String,
        /// API base URL (optional, defaults to the public REST endpoint)
        #[serde(default)]
        endpoint_url: Option<String>,
        /// Request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Gandi { token, api_key, .. } => {
                if token.is_empty() && api_key.is_empty() {
                    return Err(Error::config(
                        "Gandi requires either a token or an api_key",
                    ));
                }
                Ok(())
            }
            ProviderConfig::Softlayer {
                username,
                api_key,
                timeout_secs,
                ..
            } => {
                if username.is_empty() || api_key.is_empty() {
                    return Err(Error::config(
                        "SoftLayer requires both a username and an api_key",
                    ));
                }
                if *timeout_secs == 0 {
                    return Err(Error::config("SoftLayer timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Gandi { .. } => "gandi",
            ProviderConfig::Softlayer { .. } => "softlayer",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }

    /// Fill empty credentials from values found outside the file
    ///
    /// Credentials already present in the configuration win.
    pub fn fill_credentials(&mut self, token: Option<String>, api_key: Option<String>) {
        match self {
            ProviderConfig::Gandi {
                token: current_token,
                api_key: current_key,
                ..
            } => {
                if current_token.is_empty()
                    && let Some(token) = token
                {
                    *current_token = token;
                }
                if current_key.is_empty()
                    && let Some(api_key) = api_key
                {
                    *current_key = api_key;
                }
            }
            ProviderConfig::Softlayer {
                api_key: current_key,
                ..
            } => {
                if current_key.is_empty()
                    && let Some(api_key) = api_key
                {
                    *current_key = api_key;
                }
            }
            ProviderConfig::Custom { .. } => {}
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Desired state of one zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone name (e.g., "example.com")
    pub name: String,

    /// Desired records; labels relative to the zone, `@` for the apex
    #[serde(default)]
    pub records: Vec<Record>,

    /// Labels left untouched: exact names or `*.suffix` patterns
    #[serde(default)]
    pub unmanaged: Vec<String>,
}

impl ZoneConfig {
    /// Create an empty zone configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            unmanaged: Vec::new(),
        }
    }

    /// Set the desired records
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Set the unmanaged label patterns
    pub fn with_unmanaged(mut self, unmanaged: Vec<String>) -> Self {
        self.unmanaged = unmanaged;
        self
    }

    /// Validate the zone configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim_end_matches('.').is_empty() {
            return Err(Error::config("Zone name cannot be empty"));
        }
        Ok(())
    }

    /// Desired records with labels and host targets resolved against the zone
    pub fn desired_records(&self) -> Vec<Record> {
        self.records
            .iter()
            .cloned()
            .map(|mut record| {
                record.canonicalize(&self.name);
                record
            })
            .collect()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Keep applying a zone's remaining corrections after one fails
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            continue_on_error: default_continue_on_error(),
        }
    }
}

fn default_continue_on_error() -> bool {
    true
}
