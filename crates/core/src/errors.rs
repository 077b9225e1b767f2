//! Canonical error taxonomy shared across the workspace.

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Local store failures, wrapped by the storage crate.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection pool failure
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Query or statement execution failure
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failure
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Anything else the storage layer cannot classify
    #[error("{0}")]
    Internal(String),
}

/// Retry policy class for sync failures. The engine never retries on its
/// own; callers use this to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
}

/// Errors that can occur during sync and storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local store error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Network unreachable or transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the sync server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Stable device identity could not be resolved
    #[error("Device identity error: {0}")]
    DeviceIdentity(String),

    /// A sync phase failed; the originating cause is retained.
    #[error("{context}: {source}")]
    Sync {
        context: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Wrap this error with a sync phase context ("Failed to pull" / "Failed to push").
    pub fn with_context(self, context: &'static str) -> Self {
        Self::Sync {
            context,
            source: Box::new(self),
        }
    }

    /// Classify for caller-side retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network(_) => RetryClass::Retryable,
            Self::Api { status, .. } => match *status {
                408 | 409 | 423 | 425 | 429 => RetryClass::Retryable,
                500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            Self::Sync { source, .. } => source.retry_class(),
            _ => RetryClass::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_class_for_server_errors_is_retryable() {
        assert_eq!(Error::api(500, "boom").retry_class(), RetryClass::Retryable);
        assert_eq!(Error::api(429, "slow down").retry_class(), RetryClass::Retryable);
        assert_eq!(Error::api(400, "bad").retry_class(), RetryClass::Permanent);
        assert_eq!(
            Error::Network("refused".to_string()).retry_class(),
            RetryClass::Retryable
        );
    }

    #[test]
    fn sync_context_preserves_cause_and_class() {
        let err = Error::Database(DatabaseError::Query("locked".to_string()))
            .with_context("Failed to pull");
        assert_eq!(err.to_string(), "Failed to pull: Database error: Query failed: locked");
        assert_eq!(err.retry_class(), RetryClass::Permanent);

        let err = Error::api(503, "maintenance").with_context("Failed to push");
        assert_eq!(err.retry_class(), RetryClass::Retryable);
    }
}
