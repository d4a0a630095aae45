//! Error types for Redis driver operations.
//!
//! All errors convert into [`DriverError`] so the layers above treat a
//! Redis outage like any other backend failure.
//!
//! [`DriverError`]: cachet_driver::DriverError

use cachet_driver::DriverError;
use redis::RedisError;

/// Error type for Redis driver operations.
///
/// You typically don't handle this error directly. It appears when:
///
/// - Using [`RedisDriverBuilder::build`] with an invalid connection URL
/// - Performing the first cache operation when Redis is unreachable
///   (the connection is established lazily)
/// - Performing cache operations when the Redis server returns an error
///
/// [`RedisDriverBuilder::build`]: crate::RedisDriverBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis driver error: {0}")]
    Redis(#[from] RedisError),

    /// The driver was built from a connection that can't be re-established.
    #[error("Redis connection is not initialized and no client is configured")]
    MissingClient,
}

impl Error {
    /// Whether the failure is about reaching the server at all.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Redis(error) => {
                error.is_io_error() || error.is_connection_refusal() || error.is_connection_dropped()
            }
            Error::MissingClient => false,
        }
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
