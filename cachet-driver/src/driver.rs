use std::sync::Arc;

use async_trait::async_trait;
use cachet_core::{DriverLabel, Lookup, Raw};
use indexmap::IndexMap;

use crate::DriverError;

pub type DriverResult<T> = Result<T, DriverError>;

/// Minimal contract every storage backend implements.
///
/// Keys reaching a driver are physical keys: already namespaced and
/// validated by the layer above. TTLs are whole seconds relative to the
/// call, `None` meaning the entry never expires.
///
/// Batch methods have the same per-key semantics as their singular
/// counterparts. The defaults loop over the singular calls; backends with
/// native batch primitives override them.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Reads a key, keeping "absent" and "stored empty value" apart.
    ///
    /// Expired entries are reported as [`Lookup::Miss`] and removed.
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>>;

    /// Projection of [`Driver::fetch`] without the hit flag.
    async fn get(&self, key: &str) -> DriverResult<Option<Raw>> {
        Ok(self.fetch(key).await?.into_option())
    }

    /// Stores a value, overwriting any previous entry.
    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()>;

    /// Removes a key. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> DriverResult<()>;

    /// Removes every entry this driver can see, regardless of namespace.
    async fn clear(&self) -> DriverResult<()>;

    async fn fetch_multiple(&self, keys: &[String]) -> DriverResult<IndexMap<String, Lookup<Raw>>> {
        let mut found = IndexMap::with_capacity(keys.len());
        for key in keys {
            found.insert(key.clone(), self.fetch(key).await?);
        }
        Ok(found)
    }

    async fn get_multiple(&self, keys: &[String]) -> DriverResult<IndexMap<String, Option<Raw>>> {
        Ok(self
            .fetch_multiple(keys)
            .await?
            .into_iter()
            .map(|(key, lookup)| (key, lookup.into_option()))
            .collect())
    }

    /// Writes every entry with the same TTL.
    ///
    /// All entries are attempted; the first failure is returned.
    async fn set_multiple(&self, entries: IndexMap<String, Raw>, ttl: Option<u64>) -> DriverResult<()> {
        let mut first_error = None;
        for (key, value) in entries {
            if let Err(error) = self.set(&key, value, ttl).await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn delete_multiple(&self, keys: &[String]) -> DriverResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(error) = self.delete(key).await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Must agree with `fetch(key).is_hit()`.
    async fn has(&self, key: &str) -> DriverResult<bool> {
        Ok(self.fetch(key).await?.is_hit())
    }

    /// Returns the label of this driver for logs and tier paths.
    fn label(&self) -> DriverLabel {
        DriverLabel::new_static("driver")
    }

    /// Longest key in bytes the backend accepts, if it has a ceiling.
    fn max_key_length(&self) -> Option<usize> {
        None
    }

    /// Whether the backend can run in this environment at all.
    ///
    /// Constructors check this and fail with [`DriverError::Unsupported`].
    fn is_supported() -> bool
    where
        Self: Sized,
    {
        true
    }
}

macro_rules! forward_driver {
    ($($impl_header:tt)*) => {
        #[async_trait]
        $($impl_header)* {
            async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
                (**self).fetch(key).await
            }

            async fn get(&self, key: &str) -> DriverResult<Option<Raw>> {
                (**self).get(key).await
            }

            async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
                (**self).set(key, value, ttl).await
            }

            async fn delete(&self, key: &str) -> DriverResult<()> {
                (**self).delete(key).await
            }

            async fn clear(&self) -> DriverResult<()> {
                (**self).clear().await
            }

            async fn fetch_multiple(
                &self,
                keys: &[String],
            ) -> DriverResult<IndexMap<String, Lookup<Raw>>> {
                (**self).fetch_multiple(keys).await
            }

            async fn get_multiple(
                &self,
                keys: &[String],
            ) -> DriverResult<IndexMap<String, Option<Raw>>> {
                (**self).get_multiple(keys).await
            }

            async fn set_multiple(
                &self,
                entries: IndexMap<String, Raw>,
                ttl: Option<u64>,
            ) -> DriverResult<()> {
                (**self).set_multiple(entries, ttl).await
            }

            async fn delete_multiple(&self, keys: &[String]) -> DriverResult<()> {
                (**self).delete_multiple(keys).await
            }

            async fn has(&self, key: &str) -> DriverResult<bool> {
                (**self).has(key).await
            }

            fn label(&self) -> DriverLabel {
                (**self).label()
            }

            fn max_key_length(&self) -> Option<usize> {
                (**self).max_key_length()
            }
        }
    };
}

forward_driver!(impl<D: Driver + ?Sized> Driver for &D);
forward_driver!(impl<D: Driver + ?Sized> Driver for Box<D>);
forward_driver!(impl<D: Driver + ?Sized> Driver for Arc<D>);
