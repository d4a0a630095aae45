//! Error types for store and item-pool operations.

use cachet_driver::{DriverError, FormatError};
use thiserror::Error;

/// Result alias for store and item-pool operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Error type for store and item-pool operations.
///
/// Backend outages on boolean operations (`set`, `delete`, `clear`, `has`)
/// are not errors: they are logged and reported as `Ok(false)`. What is left
/// here is caller input the cache refuses and failures the caller asked to
/// see.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is empty or contains one of `{}()/@:`.
    #[error("invalid cache key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected logical key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Error reported by the driver.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// The value could not be encoded or the stored payload decoded.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// An item pool failed to persist an item.
    #[error("failed to save cache item {key:?}")]
    Save {
        /// Logical key of the item.
        key: String,
        /// Underlying failure.
        #[source]
        source: DriverError,
    },

    /// An item pool was asked to save an item that was never given a value.
    #[error("cache item {0:?} has no value to save")]
    EmptyItem(String),
}
