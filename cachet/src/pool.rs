//! Item-based cache API with deferred writes.

use cachet_driver::{Lookup, Ttl, ttl};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::{
    error::{CacheError, CacheResult},
    store::{Store, validate_key},
};

/// A cache entry handed out by an [`ItemPool`].
///
/// Setters return `&mut Self` so they chain:
///
/// ```
/// # use cachet::{CacheItem, Ttl};
/// let mut item = CacheItem::new("greeting");
/// item.set("hello".to_owned()).expires_after(Some(Ttl::Seconds(60)));
/// assert!(item.is_hit());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem<T> {
    key: String,
    value: Option<T>,
    hit: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl<T> CacheItem<T> {
    /// An empty item for `key`, as returned for a miss.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            hit: false,
            expires_at: None,
        }
    }

    fn from_lookup(key: String, lookup: Lookup<T>) -> Self {
        match lookup {
            Lookup::Hit(value) => Self {
                key,
                value: Some(value),
                hit: true,
                expires_at: None,
            },
            Lookup::Miss => Self::new(key),
        }
    }

    /// Logical key of the item.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value, if the item was a hit or has been set.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Takes the value out of the item.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Whether the item holds a value.
    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// Absolute expiration, if one was set.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Replaces the value.
    pub fn set(&mut self, value: T) -> &mut Self {
        self.value = Some(value);
        self.hit = true;
        self
    }

    /// Expires the item at a fixed instant. `None` falls back to the pool's
    /// default TTL.
    pub fn expires_at(&mut self, at: Option<DateTime<Utc>>) -> &mut Self {
        self.expires_at = at;
        self
    }

    /// Expires the item `ttl` from now. `None` falls back to the pool's
    /// default TTL.
    pub fn expires_after(&mut self, ttl: Option<Ttl>) -> &mut Self {
        let now = Utc::now();
        self.expires_at = ttl.and_then(|ttl| ttl::expires_at(ttl::normalize_at(Some(ttl), now), now));
        self
    }

    /// TTL left at `now`, floored at zero.
    fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Ttl> {
        self.expires_at
            .map(|at| Ttl::Seconds(u64::try_from((at - now).num_seconds()).unwrap_or(0)))
    }
}

/// Item pool over a [`Store`].
///
/// Items saved with [`ItemPool::save_deferred`] are buffered by key and
/// written in insertion order by [`ItemPool::commit`]. Keys follow the same
/// rules and namespace as the underlying store.
#[derive(Debug)]
pub struct ItemPool<T> {
    store: Store,
    deferred: IndexMap<String, CacheItem<T>>,
}

impl<T> ItemPool<T> {
    /// Pool over `store`.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            deferred: IndexMap::new(),
        }
    }

    /// The store behind this pool.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Number of items waiting for [`ItemPool::commit`].
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

impl<T> ItemPool<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Reads `key` into an item. Misses come back as empty items.
    pub async fn get_item(&self, key: &str) -> CacheResult<CacheItem<T>> {
        let lookup = self.store.fetch(key).await?;
        Ok(CacheItem::from_lookup(key.to_owned(), lookup))
    }

    /// Reads several keys, in the order given.
    pub async fn get_items<I, K>(&self, keys: I) -> CacheResult<IndexMap<String, CacheItem<T>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Ok(self
            .store
            .fetch_multiple(keys)
            .await?
            .into_iter()
            .map(|(key, lookup)| (key.clone(), CacheItem::from_lookup(key, lookup)))
            .collect())
    }

    /// Whether `key` is present in the store. Deferred items don't count.
    pub async fn has_item(&self, key: &str) -> CacheResult<bool> {
        self.store.has(key).await
    }

    /// Removes `key` from the store and drops a pending deferred write.
    pub async fn delete_item(&mut self, key: &str) -> CacheResult<bool> {
        self.deferred.shift_remove(key);
        self.store.delete(key).await
    }

    /// Removes several keys and drops their pending deferred writes.
    pub async fn delete_items<I, K>(&mut self, keys: I) -> CacheResult<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        for key in &keys {
            self.deferred.shift_remove(key.as_ref());
        }
        self.store.delete_multiple(keys).await
    }

    /// Clears the whole store and drops every pending deferred write.
    pub async fn clear(&mut self) -> CacheResult<bool> {
        self.deferred.clear();
        self.store.clear().await
    }

    /// Writes `item` now.
    ///
    /// An absolute expiration is turned into a TTL measured at this moment;
    /// without one the store's default TTL applies. Backend failures come
    /// back as [`CacheError::Save`].
    pub async fn save(&self, item: &CacheItem<T>) -> CacheResult<()> {
        let value = item
            .value
            .as_ref()
            .ok_or_else(|| CacheError::EmptyItem(item.key.clone()))?;
        let ttl = item.remaining_ttl(Utc::now());
        self.store
            .write(&item.key, value, ttl)
            .await?
            .map_err(|source| CacheError::Save {
                key: item.key.clone(),
                source,
            })
    }

    /// Buffers `item` until [`ItemPool::commit`]. A later item for the same
    /// key replaces the earlier one.
    pub fn save_deferred(&mut self, item: CacheItem<T>) -> CacheResult<()> {
        validate_key(&item.key)?;
        self.deferred.insert(item.key.clone(), item);
        Ok(())
    }

    /// Saves every buffered item in insertion order.
    ///
    /// The buffer is emptied whatever happens. Returns `true` only when all
    /// items were saved; failures are logged.
    pub async fn commit(&mut self) -> bool {
        let mut ok = true;
        for (key, item) in std::mem::take(&mut self.deferred) {
            if let Err(error) = self.save(&item).await {
                warn!(key = %key, %error, "deferred cache item was not saved");
                ok = false;
            }
        }
        ok
    }
}
