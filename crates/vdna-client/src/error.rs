//! Client error types.

use thiserror::Error;

/// Result type for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// HTTP status for API errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is retryable.
    ///
    /// Callers decide whether to act on this; the preview poller never
    /// retries a failed poll on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::api(400, "Unsupported model");
        assert_eq!(err.to_string(), "API error: 400 - Unsupported model");
        assert_eq!(err.http_status(), Some(400));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(ClientError::api(500, "boom").is_retryable());
        assert!(ClientError::api(503, "unavailable").is_retryable());
        assert!(ClientError::api(429, "slow down").is_retryable());
        assert!(!ClientError::api(404, "missing").is_retryable());
        assert!(!ClientError::invalid_response("no task id").is_retryable());
        assert!(!ClientError::config("bad url").is_retryable());
        assert!(!ClientError::invalid_input("no sources").is_retryable());
    }
}
