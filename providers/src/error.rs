//! Error types for the provider clients.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// All provider failures are recoverable by design: callers fall back or
/// treat the result as unavailable, they never crash on one of these.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("mock response not configured for: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the underlying failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
