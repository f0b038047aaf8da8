//! Errors raised while talking to the spreadsheet-backed job store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-2xx HTTP status.
    #[error("store API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The store accepted the request but reported `ok: false`.
    #[error("store rejected {action}: {message}")]
    Rejected { action: &'static str, message: String },

    /// The body was not the JSON shape we expect.
    #[error("malformed store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = StoreError::ApiError {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(
            err.to_string(),
            "store API error (status 500): Internal Server Error"
        );
    }

    #[test]
    fn rejected_display() {
        let err = StoreError::Rejected {
            action: "updateVideoStatus",
            message: "row not found".into(),
        };
        assert_eq!(err.to_string(), "store rejected updateVideoStatus: row not found");
    }
}
