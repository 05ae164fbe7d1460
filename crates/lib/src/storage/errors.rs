//! Error types for the storage module
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Storage key collision for '{key}'")]
    KeyCollision { key: String },

    #[error("Storage I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage directory unavailable: {source}")]
    Directory {
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Check if this error is I/O related (retryable by the caller).
    pub fn is_io_error(&self) -> bool {
        matches!(self, StorageError::Io { .. } | StorageError::Directory { .. })
    }
}
