//! Error types for the Keel client

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Keel client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Error body rendered by the orchestrator
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create an API error from a raw response body
    ///
    /// Unwraps `{"error": "..."}` bodies; anything else is kept verbatim.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.to_string());
        Self::api_error(status, message)
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a name conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ApiError { status: 409, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_body() {
        let err = ClientError::from_body(400, r#"{"error":"steps: cannot be blank"}"#);
        assert_eq!(
            err.to_string(),
            "API error (status 400): steps: cannot be blank"
        );
        assert!(err.is_client_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_plain_body() {
        let err = ClientError::from_body(502, "Bad Gateway");
        assert!(err.is_server_error());
        assert!(matches!(err, ClientError::ApiError { ref message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_status_helpers() {
        assert!(ClientError::api_error(404, "gone").is_not_found());
        assert!(ClientError::api_error(409, "taken").is_conflict());
        assert!(!ClientError::api_error(500, "boom").is_client_error());
    }
}
