//! Error types for Memcached driver operations.

use cachet_driver::DriverError;
use memcache::MemcacheError;
use tokio::task::JoinError;

/// Error type for Memcached driver operations.
///
/// Converts into [`DriverError`], with socket failures reported as
/// connection errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying memcache client.
    #[error("Memcached driver error: {0}")]
    Memcache(#[from] MemcacheError),

    /// The blocking client call panicked or was cancelled.
    #[error("Memcached task failed: {0}")]
    Task(#[from] JoinError),
}

impl Error {
    /// Whether the failure is about reaching the server at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Memcache(MemcacheError::IOError(_)))
    }
}

impl From<Error> for DriverError {
    fn from(error: Error) -> Self {
        if error.is_connection_error() {
            DriverError::connection(error)
        } else {
            DriverError::internal(error)
        }
    }
}
