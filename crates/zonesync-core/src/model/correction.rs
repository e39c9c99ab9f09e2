//! Executable unit of change against a provider

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;

/// Future returned by a correction's action
pub type CorrectionFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type Action = Arc<dyn Fn() -> CorrectionFuture + Send + Sync>;

/// A human-readable message paired with the API call that carries it out
///
/// Report corrections have no action; they exist for plan display only.
/// Each invocation of [`Correction::apply`] issues exactly one mutation.
/// Whether a repeated invocation is safe depends on the provider.
#[derive(Clone)]
pub struct Correction {
    /// Description shown in previews and logs
    pub message: String,
    action: Option<Action>,
}

impl Correction {
    /// Create a correction that performs `action` when applied
    pub fn new<F, Fut>(message: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            message: message.into(),
            action: Some(Arc::new(move || Box::pin(action()))),
        }
    }

    /// Create a display-only correction
    pub fn report(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: None,
        }
    }

    /// Whether this correction only reports and performs no mutation
    pub fn is_report(&self) -> bool {
        self.action.is_none()
    }

    /// Execute the correction
    pub async fn apply(&self) -> Result<()> {
        match &self.action {
            Some(action) => action().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correction")
            .field("message", &self.message)
            .field("report", &self.is_report())
            .finish()
    }
}
