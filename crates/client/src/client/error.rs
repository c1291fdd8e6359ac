//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server returned a non-2xx status that renewal did not resolve
    #[error("Server error {status}: {body}")]
    Http { status: u16, body: String },

    /// Renewal failed or no refresh credential was available
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// No response within the request ceiling
    #[error("Request timed out")]
    Timeout,

    /// Transport-level failure (DNS, connection refused, TLS)
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Request path was rejected before sending
    #[error("Invalid request path: {0:?}")]
    InvalidPath(String),

    /// Session store could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Create error from HTTP status code and response body
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        Self::Http {
            status: status.as_u16(),
            body,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credential (after any renewal)
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_helpers() {
        let err = ClientError::from_status(reqwest::StatusCode::UNAUTHORIZED, "nope".into());
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());

        assert_eq!(ClientError::SessionExpired.status(), None);
        assert!(!ClientError::Timeout.is_unauthorized());
    }

    #[test]
    fn display_includes_body() {
        let err = ClientError::Http {
            status: 400,
            body: "{\"title\":[\"required\"]}".into(),
        };
        assert_eq!(err.to_string(), "Server error 400: {\"title\":[\"required\"]}");
    }
}
