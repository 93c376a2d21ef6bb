//! Error types for the daybook client

use daybook_core::RemoteError;
use thiserror::Error;

/// Daybook client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ClientError> for RemoteError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Server { status, message } => RemoteError::Status { status, message },
            ClientError::Http(e) if e.is_decode() => RemoteError::Decode(e.to_string()),
            ClientError::Http(e) => RemoteError::Transport(e.to_string()),
            ClientError::Json(e) => RemoteError::Decode(e.to_string()),
            ClientError::InvalidResponse(message) => RemoteError::Decode(message),
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
