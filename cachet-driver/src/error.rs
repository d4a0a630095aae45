//! Error types for driver operations.

use cachet_core::DriverLabel;
use thiserror::Error;

use crate::format::FormatError;

/// Error type for driver operations.
///
/// This enum categorizes errors that can occur while talking to a storage
/// backend into groups the layers above handle differently: backend failures
/// are reported as an unsuccessful write, everything else is surfaced.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote backends (e.g., Redis).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),

    /// The key exceeds the backend's key-length ceiling.
    #[error("key of {len} bytes exceeds the {max}-byte limit of the {driver} driver")]
    KeyTooLong {
        /// Driver that rejected the key.
        driver: DriverLabel,
        /// Length of the rejected key in bytes.
        len: usize,
        /// Maximum accepted length in bytes.
        max: usize,
    },

    /// The backend can't be used in this environment.
    #[error("cache driver '{0}' is not supported in this environment")]
    Unsupported(DriverLabel),

    /// A chain driver was built without tiers.
    #[error("chain driver requires at least one tier")]
    EmptyChain,
}

impl DriverError {
    /// Wraps any error as an internal backend failure.
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InternalError(Box::new(error))
    }

    /// Wraps any error as a connection failure.
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConnectionError(Box::new(error))
    }

    /// Whether the error came from the storage backend itself (I/O, network,
    /// server-side rejection) rather than from the caller's input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            DriverError::InternalError(_) | DriverError::ConnectionError(_)
        )
    }
}

/// Rejects keys longer than `max` bytes.
pub fn ensure_key_length(driver: &DriverLabel, key: &str, max: usize) -> Result<(), DriverError> {
    if key.len() > max {
        return Err(DriverError::KeyTooLong {
            driver: driver.clone(),
            len: key.len(),
            max,
        });
    }
    Ok(())
}
