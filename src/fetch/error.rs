use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single upstream request, after any retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request URL: {0}")]
    Url(String),

    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited by upstream (429)")]
    RateLimited,

    #[error("upstream returned status {status}")]
    Status { status: StatusCode },

    #[error("malformed JSON body")]
    Decode(#[from] serde_json::Error),

    #[error("no attempt was made for {url}")]
    NoAttempt { url: String },
}

impl FetchError {
    /// Rate limits, server errors, transport failures and malformed bodies are
    /// worth another attempt. Client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RateLimited | FetchError::Transport(_) | FetchError::Decode(_) => true,
            FetchError::Status { status } => status.is_server_error(),
            FetchError::Url(_) | FetchError::NoAttempt { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        for code in [500u16, 502, 503, 504] {
            let err = FetchError::Status {
                status: StatusCode::from_u16(code).unwrap(),
            };
            assert!(err.is_retryable(), "{code} should be retried");
        }
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = FetchError::Status {
            status: StatusCode::BAD_REQUEST,
        };
        assert!(!err.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
    }
}
