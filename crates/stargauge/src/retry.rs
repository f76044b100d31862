//! Retry policy for page fetches.
//!
//! The upstream endpoint documents no exact retry contract, so both retry
//! counts and the rate-limit wait cap are configuration values rather than
//! hard-coded assumptions.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Default initial backoff delay for transient failures.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Default maximum backoff delay for transient failures.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Default number of retries for a transient failure on a single page.
pub const DEFAULT_TRANSPORT_RETRIES: usize = 1;

/// Default number of wait-and-resume cycles per page when rate limited.
pub const DEFAULT_RATE_LIMIT_RETRIES: u32 = 1;

/// Default cap on a single rate-limit wait.
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(900);

/// Configuration for retry behavior during collection.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between transient-failure retries.
    pub min_delay: Duration,
    /// Maximum delay between transient-failure retries.
    pub max_delay: Duration,
    /// Maximum transient-failure retries per page.
    pub transport_retries: usize,
    /// Maximum wait-and-resume cycles per page when rate limited.
    pub rate_limit_retries: u32,
    /// Cap on a single rate-limit wait, regardless of the advertised reset.
    pub max_rate_limit_wait: Duration,
    /// Whether to add jitter to transient-failure delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy for transient failures.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.transport_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_default() {
        let config = RetryConfig::default();

        assert_eq!(config.min_delay, Duration::from_millis(INITIAL_BACKOFF_MS));
        assert_eq!(config.max_delay, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.transport_retries, DEFAULT_TRANSPORT_RETRIES);
        assert_eq!(config.rate_limit_retries, DEFAULT_RATE_LIMIT_RETRIES);
        assert_eq!(config.max_rate_limit_wait, DEFAULT_MAX_RATE_LIMIT_WAIT);
        assert!(config.with_jitter);
    }

    #[test]
    fn retry_config_without_jitter() {
        let config = RetryConfig::default().with_jitter(false);
        assert!(!config.with_jitter);
    }

    #[test]
    fn into_backoff_creates_builder() {
        let config = RetryConfig::default();
        let _backoff = config.into_backoff();
    }
}
