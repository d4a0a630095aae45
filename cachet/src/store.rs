//! Namespaced, validating view over a driver.

use std::{fmt, sync::Arc};

use cachet_driver::{Driver, DriverResult, Lookup, Raw, Ttl, ValueFormat, ttl};
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use smol_str::SmolStr;
use tracing::warn;

use crate::{
    error::{CacheError, CacheResult},
    metrics,
    pool::ItemPool,
};

/// Characters a logical key may not contain.
pub const RESERVED_CHARACTERS: &[char] = &['{', '}', '(', ')', '/', '@', ':'];

const NAMESPACE_SEPARATOR: char = ':';

/// Checks a logical key before it is namespaced.
pub fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: key.to_owned(),
            reason: "key must not be empty",
        });
    }
    if key.contains(RESERVED_CHARACTERS) {
        return Err(CacheError::InvalidKey {
            key: key.to_owned(),
            reason: "key contains one of the reserved characters {}()/@:",
        });
    }
    Ok(())
}

/// A typed key/value view over a [`Driver`].
///
/// The store is the single place where keys are validated and namespaced,
/// where the default TTL is applied and where values are serialized. Every
/// read keeps a stored `None` apart from an absent key.
///
/// Write-like operations return `Ok(false)` when the backend fails; the
/// failure is logged. Invalid keys, keys over the driver's length limit and
/// serialization problems are returned as errors.
///
/// Cloning is cheap and clones share the driver.
///
/// ```
/// use cachet::{MemoryDriver, Store, Ttl};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), cachet::CacheError> {
/// let store = Store::builder(MemoryDriver::new())
///     .namespace("users")
///     .default_ttl(Ttl::Seconds(300))
///     .build();
///
/// assert!(store.set("42", "Ada", None).await?);
/// assert_eq!(store.get::<String>("42").await?, Some("Ada".to_owned()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Store {
    driver: Arc<dyn Driver>,
    namespace: SmolStr,
    default_ttl: Option<Ttl>,
    format: ValueFormat,
}

impl Store {
    /// Store without namespace or default TTL, storing JSON.
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::builder(driver).build()
    }

    /// Starts a builder over `driver`.
    pub fn builder(driver: impl Driver + 'static) -> StoreBuilder {
        StoreBuilder::shared(Arc::new(driver))
    }

    /// The driver this store writes to.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Prefix applied to every key; empty when the store is not namespaced.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// TTL used when a write doesn't pass one.
    pub fn default_ttl(&self) -> Option<Ttl> {
        self.default_ttl
    }

    /// Format values are serialized with.
    pub fn format(&self) -> ValueFormat {
        self.format
    }

    /// A view over the same driver with `namespace` nested under this
    /// store's namespace.
    ///
    /// Note that [`Store::clear`] on the returned view still clears the whole
    /// backing store.
    pub fn with_namespace(&self, namespace: &str) -> Store {
        let namespace = match (self.namespace.is_empty(), namespace.is_empty()) {
            (_, true) => self.namespace.clone(),
            (true, false) => SmolStr::new(namespace),
            (false, false) => {
                SmolStr::from(format!("{}{NAMESPACE_SEPARATOR}{namespace}", self.namespace))
            }
        };
        Store {
            namespace,
            ..self.clone()
        }
    }

    /// An item pool over this store, holding values of type `T`.
    pub fn pool<T>(&self) -> ItemPool<T> {
        ItemPool::new(self.clone())
    }

    /// Validates `key` and turns it into the key the driver sees.
    pub fn physical_key(&self, key: &str) -> CacheResult<String> {
        validate_key(key)?;
        if self.namespace.is_empty() {
            Ok(key.to_owned())
        } else {
            Ok(format!("{}{NAMESPACE_SEPARATOR}{key}", self.namespace))
        }
    }

    fn effective_ttl(&self, ttl: Option<Ttl>) -> Option<u64> {
        ttl::normalize(ttl.or(self.default_ttl))
    }

    fn decode<T: DeserializeOwned>(&self, lookup: Lookup<Raw>) -> CacheResult<Lookup<T>> {
        Ok(lookup.try_map(|raw| self.format.deserialize(&raw))?)
    }

    /// Turns a backend failure into `Ok(false)`.
    fn settle(&self, operation: &'static str, result: DriverResult<()>) -> CacheResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(error) if error.is_backend_failure() => {
                warn!(
                    namespace = %self.namespace,
                    driver = %self.driver.label(),
                    operation,
                    %error,
                    "cache backend failure"
                );
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Reads `key`, telling a stored value apart from an absent one.
    pub async fn fetch<T>(&self, key: &str) -> CacheResult<Lookup<T>>
    where
        T: DeserializeOwned,
    {
        let physical = self.physical_key(key)?;
        let raw = self.driver.fetch(&physical).await?;
        metrics::record_reads(&self.namespace, raw.is_hit() as u64, raw.is_miss() as u64);
        self.decode(raw)
    }

    /// Reads `key`, folding a miss into `None`.
    ///
    /// For `T = Option<_>` a stored `None` and a miss look the same here;
    /// use [`Store::fetch`] when that matters.
    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self.fetch(key).await?.into_option())
    }

    /// Reads `key`, returning `default` on a miss.
    pub async fn get_or<T>(&self, key: &str, default: T) -> CacheResult<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.fetch(key).await?.unwrap_or(default))
    }

    /// Serializes and writes, returning the driver's own result.
    pub(crate) async fn write<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Ttl>,
    ) -> CacheResult<DriverResult<()>>
    where
        T: Serialize + ?Sized,
    {
        let physical = self.physical_key(key)?;
        let raw = self.format.serialize(value)?;
        let result = self
            .driver
            .set(&physical, raw, self.effective_ttl(ttl))
            .await;
        metrics::record_write(&self.namespace, 1, result.is_ok());
        Ok(result)
    }

    /// Writes `value` under `key`.
    ///
    /// `ttl` takes precedence over the store's default TTL; with neither the
    /// entry never expires.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Ttl>) -> CacheResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let result = self.write(key, value, ttl).await?;
        self.settle("set", result)
    }

    /// Like [`Store::set`], but a backend failure is returned as an error.
    pub async fn try_set<T>(&self, key: &str, value: &T, ttl: Option<Ttl>) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.write(key, value, ttl).await??)
    }

    /// Removes `key`. Removing an absent key succeeds.
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let physical = self.physical_key(key)?;
        let result = self.driver.delete(&physical).await;
        self.settle("delete", result)
    }

    /// Removes every entry of the backing driver, not only this namespace.
    pub async fn clear(&self) -> CacheResult<bool> {
        let result = self.driver.clear().await;
        self.settle("clear", result)
    }

    /// Whether `key` is present. A failing backend reports `false`.
    pub async fn has(&self, key: &str) -> CacheResult<bool> {
        let physical = self.physical_key(key)?;
        match self.driver.has(&physical).await {
            Ok(found) => Ok(found),
            Err(error) => self.settle("has", Err(error)).map(|_| false),
        }
    }

    /// Maps logical keys to physical ones, in caller order.
    fn map_keys<I, K>(&self, keys: I) -> CacheResult<IndexMap<String, String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                Ok((key.to_owned(), self.physical_key(key)?))
            })
            .collect()
    }

    /// Reads several keys. The result is keyed by logical key, in the order
    /// the keys were given.
    pub async fn fetch_multiple<T, I, K>(&self, keys: I) -> CacheResult<IndexMap<String, Lookup<T>>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mapped = self.map_keys(keys)?;
        if mapped.is_empty() {
            return Ok(IndexMap::new());
        }
        let physical: Vec<String> = mapped.values().cloned().collect();
        let mut fetched = self.driver.fetch_multiple(&physical).await?;

        let mut hits = 0;
        let mut out = IndexMap::with_capacity(mapped.len());
        for (logical, physical) in mapped {
            let raw = fetched.swap_remove(&physical).unwrap_or(Lookup::Miss);
            hits += raw.is_hit() as u64;
            out.insert(logical, self.decode(raw)?);
        }
        metrics::record_reads(&self.namespace, hits, out.len() as u64 - hits);
        Ok(out)
    }

    /// Reads several keys, substituting `default` for every miss.
    pub async fn get_multiple<T, I, K>(&self, keys: I, default: T) -> CacheResult<IndexMap<String, T>>
    where
        T: DeserializeOwned + Clone,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Ok(self
            .fetch_multiple(keys)
            .await?
            .into_iter()
            .map(|(key, lookup)| (key, lookup.unwrap_or(default.clone())))
            .collect())
    }

    /// Writes several entries with one TTL.
    pub async fn set_multiple<T, I, K>(&self, entries: I, ttl: Option<Ttl>) -> CacheResult<bool>
    where
        T: Serialize,
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
    {
        let mut raw = IndexMap::new();
        for (key, value) in entries {
            raw.insert(self.physical_key(key.as_ref())?, self.format.serialize(&value)?);
        }
        if raw.is_empty() {
            return Ok(true);
        }
        let count = raw.len() as u64;
        let result = self
            .driver
            .set_multiple(raw, self.effective_ttl(ttl))
            .await;
        metrics::record_write(&self.namespace, count, result.is_ok());
        self.settle("set_multiple", result)
    }

    /// Removes several keys.
    pub async fn delete_multiple<I, K>(&self, keys: I) -> CacheResult<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let physical: Vec<String> = self.map_keys(keys)?.into_values().collect();
        if physical.is_empty() {
            return Ok(true);
        }
        let result = self.driver.delete_multiple(&physical).await;
        self.settle("delete_multiple", result)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("driver", &self.driver.label())
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .field("format", &self.format)
            .finish()
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    driver: Arc<dyn Driver>,
    namespace: SmolStr,
    default_ttl: Option<Ttl>,
    format: ValueFormat,
}

impl StoreBuilder {
    /// Starts a builder over a driver that is already shared.
    pub fn shared(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            namespace: SmolStr::default(),
            default_ttl: None,
            format: ValueFormat::default(),
        }
    }

    /// Prefix for every key. Empty means no prefix.
    pub fn namespace(mut self, namespace: impl Into<SmolStr>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// TTL for writes that don't pass one.
    pub fn default_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.default_ttl = Some(ttl.into());
        self
    }

    /// Like [`StoreBuilder::default_ttl`], accepting "no default".
    pub fn maybe_default_ttl(mut self, ttl: Option<Ttl>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Serialization format for values.
    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Builds the store.
    pub fn build(self) -> Store {
        Store {
            driver: self.driver,
            namespace: self.namespace,
            default_ttl: self.default_ttl,
            format: self.format,
        }
    }
}
