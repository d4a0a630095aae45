//! Driver factories: turning a [`StoreConfig`] into a driver.

use std::sync::Arc;

use async_trait::async_trait;
use cachet_driver::{ChainDriver, Driver, MemoryDriver};
use tracing::debug;

use crate::{config::StoreConfig, error::ConfigError};

/// Creates drivers for the driver names it supports.
///
/// Factories for external services hold an already connected handle and
/// hand out drivers sharing it.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Whether this factory builds drivers named `driver`.
    fn supports(&self, driver: &str) -> bool;

    /// Builds the driver for `config`.
    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError>;
}

/// Finds the first factory supporting the configured driver name.
pub(crate) async fn create_driver(
    factories: &[Arc<dyn DriverFactory>],
    config: &StoreConfig,
) -> Result<Arc<dyn Driver>, ConfigError> {
    for factory in factories {
        if factory.supports(&config.driver) {
            debug!(driver = %config.driver, "Creating cache driver");
            return factory.create(config).await;
        }
    }
    Err(ConfigError::UnknownDriver(config.driver.clone()))
}

/// Factory for the drivers that need no external handle: `memory` (alias
/// `array`) and `file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltInDriverFactory;

#[async_trait]
impl DriverFactory for BuiltInDriverFactory {
    fn supports(&self, driver: &str) -> bool {
        matches!(driver, "memory" | "array" | "file")
    }

    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
        match config.driver.as_str() {
            "memory" | "array" => {
                let driver = match &config.options.label {
                    Some(label) => MemoryDriver::new().with_label(label.as_str()),
                    None => MemoryDriver::new(),
                };
                Ok(Arc::new(driver))
            }
            #[cfg(feature = "file")]
            "file" => {
                use cachet_file::FileDriver;

                let mut builder = FileDriver::builder();
                if let Some(directory) = &config.options.directory {
                    builder = builder.directory(directory);
                }
                if let Some(label) = &config.options.label {
                    builder = builder.label(label.as_str());
                }
                let driver = builder
                    .build()
                    .map_err(|error| ConfigError::Driver(error.into()))?;
                Ok(Arc::new(driver))
            }
            #[cfg(not(feature = "file"))]
            "file" => Err(ConfigError::BackendNotAvailable("file".to_string())),
            other => Err(ConfigError::UnknownDriver(other.to_owned())),
        }
    }
}

/// Factory for the `chain` driver.
///
/// `options.stores` lists tier driver names, closest tier first. Each tier is
/// created with default settings through the wrapped factories.
#[derive(Clone)]
pub struct ChainDriverFactory {
    factories: Vec<Arc<dyn DriverFactory>>,
}

impl ChainDriverFactory {
    /// Chain factory resolving tiers through `factories`.
    pub fn new(factories: Vec<Arc<dyn DriverFactory>>) -> Self {
        Self { factories }
    }
}

#[async_trait]
impl DriverFactory for ChainDriverFactory {
    fn supports(&self, driver: &str) -> bool {
        driver == "chain"
    }

    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
        let tiers = &config.options.stores;
        if tiers.is_empty() {
            return Err(ConfigError::invalid(
                "chain",
                "options.stores must list at least one driver",
            ));
        }

        let mut builder = ChainDriver::builder();
        for name in tiers {
            if name.is_empty() {
                return Err(ConfigError::invalid("chain", "tier driver names must not be empty"));
            }
            if name == "chain" {
                return Err(ConfigError::invalid("chain", "a chain can't contain a chain"));
            }
            let tier = create_driver(&self.factories, &StoreConfig::for_driver(name.as_str())).await?;
            builder = builder.shared_tier(tier);
        }
        if let Some(label) = &config.options.label {
            builder = builder.label(label.as_str());
        }
        Ok(Arc::new(builder.build()?))
    }
}

#[cfg(feature = "sql")]
pub use sql::SqlDriverFactory;

#[cfg(feature = "sql")]
mod sql {
    use super::*;
    use cachet_sql::{Dialect, SqlConnection, SqlDriver, SqlDriverOptions};

    /// Factory for the `sql` driver over an injected connection.
    ///
    /// Store options override the factory's defaults field by field.
    #[derive(Clone)]
    pub struct SqlDriverFactory {
        connection: Arc<dyn SqlConnection>,
        defaults: SqlDriverOptions,
    }

    impl SqlDriverFactory {
        /// Factory over `connection` with default table layout.
        pub fn new(connection: Arc<dyn SqlConnection>) -> Self {
            Self {
                connection,
                defaults: SqlDriverOptions::default(),
            }
        }

        /// Replaces the options used when a store doesn't set them.
        pub fn with_defaults(mut self, defaults: SqlDriverOptions) -> Self {
            self.defaults = defaults;
            self
        }

        fn options_for(&self, config: &StoreConfig) -> SqlDriverOptions {
            let options = &config.options;
            let mut resolved = self.defaults.clone();
            let schema = &mut resolved.schema;
            for (target, value) in [
                (&mut schema.table, &options.table),
                (&mut schema.key_column, &options.key_column),
                (&mut schema.value_column, &options.value_column),
                (&mut schema.expiry_column, &options.expiry_column),
                (&mut schema.created_column, &options.created_column),
            ] {
                if let Some(value) = value {
                    target.clone_from(value);
                }
            }
            if let Some(auto_create_table) = options.auto_create_table {
                resolved.auto_create_table = auto_create_table;
            }
            resolved
        }
    }

    #[async_trait]
    impl DriverFactory for SqlDriverFactory {
        fn supports(&self, driver: &str) -> bool {
            driver == "sql"
        }

        async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
            if let Some(name) = &config.options.dialect {
                let expected = Dialect::from_name(name)
                    .map_err(|error| ConfigError::invalid("sql", error.to_string()))?;
                let actual = self.connection.dialect();
                if expected != actual {
                    return Err(ConfigError::invalid(
                        "sql",
                        format!("dialect {expected} was configured but the connection speaks {actual}"),
                    ));
                }
            }

            let mut builder = SqlDriver::builder(self.connection.clone()).options(self.options_for(config));
            if let Some(label) = &config.options.label {
                builder = builder.label(label.as_str());
            }
            let driver = builder
                .build()
                .await
                .map_err(|error| ConfigError::Driver(error.into()))?;
            Ok(Arc::new(driver))
        }
    }
}

#[cfg(feature = "redis")]
pub use self::redis::RedisDriverFactory;

#[cfg(feature = "redis")]
mod redis {
    use super::*;
    use cachet_redis::RedisDriver;

    /// Factory for the `redis` driver sharing one injected connection.
    #[derive(Clone)]
    pub struct RedisDriverFactory {
        driver: RedisDriver,
    }

    impl RedisDriverFactory {
        /// Factory handing out clones of `driver`.
        pub fn new(driver: RedisDriver) -> Self {
            Self { driver }
        }
    }

    #[async_trait]
    impl DriverFactory for RedisDriverFactory {
        fn supports(&self, driver: &str) -> bool {
            driver == "redis"
        }

        async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
            let driver = match &config.options.label {
                Some(label) => self.driver.clone().with_label(label.as_str()),
                None => self.driver.clone(),
            };
            Ok(Arc::new(driver))
        }
    }
}

#[cfg(feature = "memcached")]
pub use memcached::MemcachedDriverFactory;

#[cfg(feature = "memcached")]
mod memcached {
    use super::*;
    use cachet_memcached::MemcachedDriver;

    /// Factory for the `memcached` driver sharing one injected client.
    #[derive(Clone)]
    pub struct MemcachedDriverFactory {
        driver: MemcachedDriver,
    }

    impl MemcachedDriverFactory {
        /// Factory handing out clones of `driver`.
        pub fn new(driver: MemcachedDriver) -> Self {
            Self { driver }
        }
    }

    #[async_trait]
    impl DriverFactory for MemcachedDriverFactory {
        fn supports(&self, driver: &str) -> bool {
            driver == "memcached"
        }

        async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
            let driver = match &config.options.label {
                Some(label) => self.driver.clone().with_label(label.as_str()),
                None => self.driver.clone(),
            };
            Ok(Arc::new(driver))
        }
    }
}

/// Reports drivers whose cargo feature is off, so a typo and a missing
/// feature give different errors.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UnavailableDriverFactory;

#[async_trait]
impl DriverFactory for UnavailableDriverFactory {
    fn supports(&self, driver: &str) -> bool {
        matches!(driver, "sql" | "redis" | "memcached")
    }

    async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Driver>, ConfigError> {
        Err(ConfigError::BackendNotAvailable(config.driver.clone()))
    }
}
