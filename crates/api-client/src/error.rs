use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong talking to the marketplace API.
///
/// The variants carry a human-readable message and nothing transport
/// specific, so callers can pick user-facing copy without looking at
/// status codes or headers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// Only connectivity failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Maps a non-success HTTP status and its already-extracted message.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        if status == StatusCode::NOT_FOUND {
            ApiError::NotFound(message)
        } else if status.is_server_error() {
            ApiError::Server {
                status: status.as_u16(),
                message,
            }
        } else {
            ApiError::Validation(message)
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_builder() {
            return ApiError::Validation(err.to_string());
        }
        if let Some(status) = err.status() {
            return ApiError::from_status(status, err.to_string());
        }
        // Timeouts, refused connections, broken bodies.
        ApiError::Network(err.to_string())
    }
}
