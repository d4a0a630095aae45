//! Building stores from their configuration.

use std::sync::Arc;

use cachet::{ItemPool, Store, StoreBuilder};
use indexmap::IndexMap;

use crate::{
    config::{CacheConfig, StoreConfig},
    error::ConfigError,
    factory::{
        BuiltInDriverFactory, ChainDriverFactory, DriverFactory, UnavailableDriverFactory,
        create_driver,
    },
};

/// Resolves store names into freshly built [`Store`]s.
///
/// Every call builds a new driver; [`Cache`](crate::Cache) memoizes on top.
#[derive(Clone)]
pub struct CacheStoreFactory {
    stores: Arc<IndexMap<String, StoreConfig>>,
    factories: Arc<[Arc<dyn DriverFactory>]>,
}

impl CacheStoreFactory {
    /// Starts a factory over the stores of `config`.
    pub fn builder(config: &CacheConfig) -> CacheStoreFactoryBuilder {
        CacheStoreFactoryBuilder {
            stores: config.stores.clone(),
            factories: Vec::new(),
        }
    }

    /// Factory with only the built-in drivers and `chain`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::builder(config).build()
    }

    /// Configuration of `name`.
    pub fn config(&self, name: &str) -> Result<&StoreConfig, ConfigError> {
        self.stores
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStore(name.to_owned()))
    }

    /// Names of all configured stores.
    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Builds the store `name`.
    pub async fn store(&self, name: &str) -> Result<Store, ConfigError> {
        let config = self.config(name)?;
        let driver = create_driver(&self.factories, config).await?;
        Ok(StoreBuilder::shared(driver)
            .namespace(config.namespace.as_str())
            .maybe_default_ttl(config.ttl())
            .format(config.format)
            .build())
    }

    /// Builds the store `name` and wraps it in an item pool.
    pub async fn pool<T>(&self, name: &str) -> Result<ItemPool<T>, ConfigError> {
        Ok(self.store(name).await?.pool())
    }
}

/// Builder for [`CacheStoreFactory`].
pub struct CacheStoreFactoryBuilder {
    stores: IndexMap<String, StoreConfig>,
    factories: Vec<Arc<dyn DriverFactory>>,
}

impl CacheStoreFactoryBuilder {
    /// Registers a factory. Factories registered first win when several
    /// support the same driver name; all of them win over the built-ins.
    pub fn factory(mut self, factory: impl DriverFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Registers an already shared factory.
    pub fn shared_factory(mut self, factory: Arc<dyn DriverFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Builds the factory; `chain` tiers resolve through every other factory.
    pub fn build(self) -> CacheStoreFactory {
        let mut factories = self.factories;
        factories.push(Arc::new(BuiltInDriverFactory));
        factories.push(Arc::new(UnavailableDriverFactory));

        let chain: Arc<dyn DriverFactory> = Arc::new(ChainDriverFactory::new(factories.clone()));
        factories.push(chain);

        CacheStoreFactory {
            stores: Arc::new(self.stores),
            factories: factories.into(),
        }
    }
}
