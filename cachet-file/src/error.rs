use bincode::error::{DecodeError, EncodeError};
use cachet_driver::{DriverError, DriverLabel};
use thiserror::Error;

/// Errors that can occur when using [`FileDriver`](crate::FileDriver).
#[derive(Debug, Error)]
pub enum FileError {
    /// An I/O error occurred while accessing the cache directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a cache entry.
    #[error("Serialization error: {0}")]
    Serialization(#[from] EncodeError),

    /// Failed to deserialize a cache entry.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] DecodeError),

    /// The configured path exists but is not a directory.
    #[error("Cache path is not a directory: {0}")]
    NotADirectory(String),

    /// The platform can't replace files atomically.
    #[error("File cache driver is not supported on this platform")]
    Unsupported,
}

impl From<FileError> for DriverError {
    fn from(error: FileError) -> Self {
        match error {
            FileError::Unsupported => DriverError::Unsupported(DriverLabel::new_static("file")),
            error => DriverError::internal(error),
        }
    }
}
