//! Errors for the video generation provider client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-2xx answer (bad key, unknown task, provider outage).
    #[error("provider API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// DNS, refused connection, reset mid-body.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl ProviderError {
    /// The provider answered, just not with a success. The job is left as-is
    /// and simply re-polled next tick.
    pub fn is_non_ok_response(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::ApiError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display() {
        let err = ProviderError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "rate limited, retry after 5000ms");
        assert!(err.is_non_ok_response());
    }

    #[test]
    fn api_error_display() {
        let err = ProviderError::ApiError {
            status: 401,
            message: "invalid key".into(),
        };
        assert_eq!(err.to_string(), "provider API error (status 401): invalid key");
        assert!(err.is_non_ok_response());
    }

    #[test]
    fn decode_error_is_not_a_status() {
        let err = ProviderError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(!err.is_non_ok_response());
    }
}
