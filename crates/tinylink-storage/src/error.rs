use thiserror::Error;
use tinylink_core::ShortenerError;

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        ShortenerError::PersistenceFailure(value.to_string())
    }
}
