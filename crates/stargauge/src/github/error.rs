//! Search API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when querying the search endpoint.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure (connection reset, timeout, DNS).
    #[error("network error: {0}")]
    Transport(String),

    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("authentication required or token rejected")]
    AuthRequired,

    #[error("unexpected API response (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed API response: {0}")]
    Decode(String),
}

impl SearchError {
    /// True for failures worth retrying with backoff.
    ///
    /// Rate limits are handled separately (wait until reset, not exponential
    /// backoff), and auth/decode failures never succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_transient() {
        assert!(SearchError::Transport("reset".to_string()).is_transient());

        assert!(
            !SearchError::RateLimited {
                reset_at: Utc::now()
            }
            .is_transient()
        );
        assert!(!SearchError::AuthRequired.is_transient());
        assert!(
            !SearchError::Api {
                status: 500,
                message: "boom".to_string()
            }
            .is_transient()
        );
        assert!(!SearchError::Decode("eof".to_string()).is_transient());
    }

    #[test]
    fn display_includes_reset_time() {
        let err = SearchError::RateLimited {
            reset_at: "2024-01-01T00:10:00Z".parse().unwrap(),
        };
        assert!(err.to_string().contains("2024-01-01"));
    }
}
