//! Provider endpoint and resilience configuration.
//!
//! Environment variables override the defaults:
//! - `OPENING_TRAINER_EXPLORER_URL`
//! - `OPENING_TRAINER_EVAL_URL`

use std::time::Duration;

const DEFAULT_EXPLORER_URL: &str = "https://explorer.lichess.ovh";
const DEFAULT_EVAL_URL: &str = "https://lichess.org";

/// Request timeout. The services are rate-limited and occasionally slow;
/// anything past this degrades to "no result" rather than hanging.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One retry with a short fixed backoff for idempotent GETs.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub explorer_url: String,
    pub eval_url: String,
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            eval_url: DEFAULT_EVAL_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

impl ProviderConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OPENING_TRAINER_EXPLORER_URL") {
            config.explorer_url = url;
        }
        if let Ok(url) = std::env::var("OPENING_TRAINER_EVAL_URL") {
            config.eval_url = url;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ProviderConfig::default();
        assert!(config.explorer_url.starts_with("https://"));
        assert!(config.timeout >= Duration::from_secs(1));
        assert!(config.retry_backoff < config.timeout);
    }
}
