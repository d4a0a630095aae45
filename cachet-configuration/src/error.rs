//! Error types for configuration and store resolution.

use cachet::CacheError;
use cachet_driver::DriverError;
use thiserror::Error;

/// Error raised while loading configuration or resolving a named store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be deserialized.
    #[error("failed to parse cache configuration: {0}")]
    Parse(String),

    /// No store with this name is configured.
    #[error("unknown cache store '{0}'")]
    UnknownStore(String),

    /// No registered factory supports this driver name.
    #[error("unknown cache driver '{0}'")]
    UnknownDriver(String),

    /// The driver exists but was compiled out or has no handle injected.
    #[error("cache backend '{0}' is not available")]
    BackendNotAvailable(String),

    /// The store options don't make sense for the driver.
    #[error("invalid options for '{driver}' driver: {reason}")]
    InvalidOptions {
        /// Driver name from the store configuration.
        driver: String,
        /// What is wrong.
        reason: String,
    },

    /// Building the driver failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A cache operation on the resolved store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ConfigError {
    pub(crate) fn invalid(driver: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOptions {
            driver: driver.to_owned(),
            reason: reason.into(),
        }
    }
}
