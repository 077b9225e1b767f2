//! Error types for the sync HTTP client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncClientError>;

/// Errors raised while talking to the sync server.
#[derive(Debug, Error)]
pub enum SyncClientError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the sync server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl SyncClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<SyncClientError> for stockbook_core::Error {
    fn from(err: SyncClientError) -> Self {
        match err {
            SyncClientError::Http(e) => stockbook_core::Error::Network(e.to_string()),
            SyncClientError::Json(e) => stockbook_core::Error::Serde(e),
            SyncClientError::Api { status, message } => {
                stockbook_core::Error::Api { status, message }
            }
        }
    }
}
