use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by history backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium cannot be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Stored data does not parse as history.
    #[error("history data is corrupted: {message}")]
    Corrupted {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    /// No entry has the given identifier.
    #[error("history entry `{0}` not found")]
    EntryNotFound(Uuid),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corruption error from a failed (de)serialization.
    pub fn corrupted(message: String, source: serde_json::Error) -> Self {
        StorageError::Corrupted { message, source }
    }
}
