//! The multi-store entry point.

use std::sync::Arc;

use cachet::{ItemPool, Lookup, Store, Ttl};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::OnceCell;

use crate::{
    config::CacheConfig,
    error::ConfigError,
    factory::DriverFactory,
    store_factory::{CacheStoreFactory, CacheStoreFactoryBuilder},
};

/// Named stores behind one handle.
///
/// A store is built the first time it is asked for and reused afterwards,
/// so every caller of `cache.store("sessions")` shares one driver. The
/// shortcut methods act on the default store.
///
/// ```
/// use cachet_configuration::{Cache, CacheConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), cachet_configuration::ConfigError> {
/// let config = CacheConfig::from_yaml(
///     r#"
/// stores:
///   sessions:
///     driver: memory
///     namespace: sessions
///     default_ttl: 30m
/// "#,
/// )?;
/// let cache = Cache::from_config(config);
///
/// let sessions = cache.store("sessions").await?;
/// sessions.set("abc", &42, None).await?;
/// assert_eq!(sessions.get::<i32>("abc").await?, Some(42));
///
/// // Not configured, but always there.
/// cache.set("greeting", "hello", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache {
    factory: CacheStoreFactory,
    default_store: String,
    stores: Arc<DashMap<String, Arc<OnceCell<Store>>>>,
}

impl Cache {
    /// Starts a builder over `config`.
    pub fn builder(config: CacheConfig) -> CacheBuilder {
        CacheBuilder::new(config)
    }

    /// Cache with only the built-in drivers and `chain`.
    pub fn from_config(config: CacheConfig) -> Self {
        CacheBuilder::new(config).build()
    }

    /// Parses YAML and builds a cache with the built-in drivers.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_config(CacheConfig::from_yaml(yaml)?))
    }

    /// Name of the store the shortcuts use.
    pub fn default_store_name(&self) -> &str {
        &self.default_store
    }

    /// The factory stores are built with.
    pub fn store_factory(&self) -> &CacheStoreFactory {
        &self.factory
    }

    /// The store `name`, built on first use.
    pub async fn store(&self, name: &str) -> Result<Store, ConfigError> {
        // Fail before touching the memo for unknown names.
        self.factory.config(name)?;
        let cell = self
            .stores
            .entry(name.to_owned())
            .or_default()
            .value()
            .clone();
        let store = cell.get_or_try_init(|| self.factory.store(name)).await?;
        Ok(store.clone())
    }

    /// The default store.
    pub async fn default_store(&self) -> Result<Store, ConfigError> {
        self.store(&self.default_store).await
    }

    /// An item pool over the store `name`.
    ///
    /// The store is shared; the deferred buffer belongs to the returned pool.
    pub async fn pool<T>(&self, name: &str) -> Result<ItemPool<T>, ConfigError> {
        Ok(self.store(name).await?.pool())
    }

    /// The store `name` with `namespace` nested under its own namespace.
    pub async fn store_with_namespace(&self, namespace: &str, name: &str) -> Result<Store, ConfigError> {
        Ok(self.store(name).await?.with_namespace(namespace))
    }

    /// [`Store::fetch`] on the default store.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Lookup<T>, ConfigError> {
        Ok(self.default_store().await?.fetch(key).await?)
    }

    /// [`Store::get`] on the default store.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        Ok(self.default_store().await?.get(key).await?)
    }

    /// [`Store::get_or`] on the default store.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.default_store().await?.get_or(key, default).await?)
    }

    /// [`Store::set`] on the default store.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Ttl>) -> Result<bool, ConfigError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.default_store().await?.set(key, value, ttl).await?)
    }

    /// [`Store::delete`] on the default store.
    pub async fn delete(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.default_store().await?.delete(key).await?)
    }

    /// [`Store::clear`] on the default store. Clears the whole backing
    /// driver, namespaces included.
    pub async fn clear(&self) -> Result<bool, ConfigError> {
        Ok(self.default_store().await?.clear().await?)
    }

    /// [`Store::has`] on the default store.
    pub async fn has(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.default_store().await?.has(key).await?)
    }

    /// [`Store::get_multiple`] on the default store.
    pub async fn get_multiple<T, I, K>(&self, keys: I, default: T) -> Result<IndexMap<String, T>, ConfigError>
    where
        T: DeserializeOwned + Clone,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Ok(self.default_store().await?.get_multiple(keys, default).await?)
    }

    /// [`Store::set_multiple`] on the default store.
    pub async fn set_multiple<T, I, K>(&self, entries: I, ttl: Option<Ttl>) -> Result<bool, ConfigError>
    where
        T: Serialize,
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
    {
        Ok(self.default_store().await?.set_multiple(entries, ttl).await?)
    }

    /// [`Store::delete_multiple`] on the default store.
    pub async fn delete_multiple<I, K>(&self, keys: I) -> Result<bool, ConfigError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Ok(self.default_store().await?.delete_multiple(keys).await?)
    }
}

/// Builder for [`Cache`].
///
/// A memory-backed `default` store is added when the configuration has none.
pub struct CacheBuilder {
    default_store: String,
    factory: CacheStoreFactoryBuilder,
}

impl CacheBuilder {
    /// Builder over `config`.
    pub fn new(config: CacheConfig) -> Self {
        let config = config.with_default_store();
        Self {
            factory: CacheStoreFactory::builder(&config),
            default_store: config.default,
        }
    }

    /// Registers a driver factory, e.g. one holding a Redis connection.
    pub fn factory(mut self, factory: impl DriverFactory + 'static) -> Self {
        self.factory = self.factory.factory(factory);
        self
    }

    /// Builds the cache. No driver is created until a store is used.
    pub fn build(self) -> Cache {
        Cache {
            factory: self.factory.build(),
            default_store: self.default_store,
            stores: Arc::new(DashMap::new()),
        }
    }
}
