//! Memcached driver implementation.

use async_trait::async_trait;
use bytes::Bytes;
use cachet_driver::{Driver, DriverLabel, DriverResult, Lookup, Raw, ensure_key_length};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use memcache::Client;
use tracing::trace;

use crate::error::Error;

/// Longest key accepted by this driver, in bytes.
pub const MAX_KEY_LENGTH: usize = 250;

/// Memcached reads expirations above this many seconds as a unix timestamp.
const RELATIVE_EXPIRY_LIMIT: u64 = 60 * 60 * 24 * 30;

/// Memcached cache driver based on the `memcache` crate.
///
/// TTLs are applied natively by the server for single and batch writes.
/// `clear` runs `flush_all` and wipes every key on the configured servers.
#[derive(Clone)]
pub struct MemcachedDriver {
    client: Client,
    label: DriverLabel,
}

impl MemcachedDriver {
    /// Creates new MemcachedDriver builder with default settings.
    #[must_use]
    pub fn builder() -> MemcachedDriverBuilder {
        MemcachedDriverBuilder::default()
    }

    /// Wraps an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            label: DriverLabel::new_static("memcached"),
        }
    }

    /// Sets a custom label for logs and chain tier paths.
    pub fn with_label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    fn check_key(&self, key: &str) -> DriverResult<()> {
        ensure_key_length(&self.label, key, MAX_KEY_LENGTH)
    }

    /// Runs a client call on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Client) -> Result<T, memcache::MemcacheError> + Send + 'static,
    {
        let client = self.client.clone();
        Ok(tokio::task::spawn_blocking(move || f(&client)).await??)
    }
}

/// Converts a relative TTL into memcached's `exptime`.
///
/// `0` means "never" to memcached, so no TTL maps to `0` and a zero TTL is
/// rounded up to one second. Long TTLs become absolute timestamps.
fn exptime(ttl: Option<u64>, now: DateTime<Utc>) -> u32 {
    let Some(ttl) = ttl else {
        return 0;
    };
    let ttl = ttl.max(1);
    if ttl <= RELATIVE_EXPIRY_LIMIT {
        return ttl as u32;
    }
    let now = u64::try_from(now.timestamp()).unwrap_or(0);
    u32::try_from(now.saturating_add(ttl)).unwrap_or(u32::MAX)
}

/// Part of builder pattern implementation for MemcachedDriver.
pub struct MemcachedDriverBuilder {
    servers: Vec<String>,
    label: DriverLabel,
}

impl Default for MemcachedDriverBuilder {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            label: DriverLabel::new_static("memcached"),
        }
    }
}

impl MemcachedDriverBuilder {
    /// Adds a server URL, e.g. `memcache://127.0.0.1:11211`.
    ///
    /// Call repeatedly to shard keys over several servers.
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    /// Set a custom label for this driver.
    pub fn label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Connects to the configured servers, `memcache://127.0.0.1:11211`
    /// when none were given.
    pub fn build(self) -> Result<MemcachedDriver, Error> {
        let servers = if self.servers.is_empty() {
            vec!["memcache://127.0.0.1:11211".to_owned()]
        } else {
            self.servers
        };
        trace!(?servers, "Connect memcached client");
        Ok(MemcachedDriver {
            client: Client::connect(servers)?,
            label: self.label,
        })
    }
}

#[async_trait]
impl Driver for MemcachedDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        self.check_key(key)?;
        let key = key.to_owned();
        let value = self
            .blocking(move |client| client.get::<Vec<u8>>(&key))
            .await?;
        Ok(match value {
            Some(value) => Lookup::Hit(Bytes::from(value)),
            None => Lookup::Miss,
        })
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        self.check_key(key)?;
        let key = key.to_owned();
        let exptime = exptime(ttl, Utc::now());
        self.blocking(move |client| client.set(&key, value.as_ref(), exptime))
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.check_key(key)?;
        let key = key.to_owned();
        // `false` means the key was not there, which is fine.
        self.blocking(move |client| client.delete(&key)).await?;
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        self.blocking(|client| client.flush()).await?;
        Ok(())
    }

    async fn fetch_multiple(&self, keys: &[String]) -> DriverResult<IndexMap<String, Lookup<Raw>>> {
        if keys.is_empty() {
            return Ok(IndexMap::new());
        }
        for key in keys {
            self.check_key(key)?;
        }
        let lookup_keys = keys.to_vec();
        let mut found = self
            .blocking(move |client| {
                let refs: Vec<&str> = lookup_keys.iter().map(String::as_str).collect();
                client.gets::<Vec<u8>>(&refs)
            })
            .await?;
        Ok(keys
            .iter()
            .map(|key| {
                let lookup = match found.remove(key) {
                    Some(value) => Lookup::Hit(Bytes::from(value)),
                    None => Lookup::Miss,
                };
                (key.clone(), lookup)
            })
            .collect())
    }

    async fn set_multiple(&self, entries: IndexMap<String, Raw>, ttl: Option<u64>) -> DriverResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        for key in entries.keys() {
            self.check_key(key)?;
        }
        let exptime = exptime(ttl, Utc::now());
        self.blocking(move |client| {
            entries
                .iter()
                .try_for_each(|(key, value)| client.set(key, value.as_ref(), exptime))
        })
        .await?;
        Ok(())
    }

    async fn delete_multiple(&self, keys: &[String]) -> DriverResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        for key in keys {
            self.check_key(key)?;
        }
        let keys = keys.to_vec();
        self.blocking(move |client| keys.iter().try_for_each(|key| client.delete(key).map(drop)))
            .await?;
        Ok(())
    }

    fn label(&self) -> DriverLabel {
        self.label.clone()
    }

    fn max_key_length(&self) -> Option<usize> {
        Some(MAX_KEY_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn no_ttl_never_expires() {
        assert_eq!(exptime(None, now()), 0);
    }

    #[test]
    fn zero_ttl_rounds_up_to_one_second() {
        assert_eq!(exptime(Some(0), now()), 1);
        assert_eq!(exptime(Some(60), now()), 60);
    }

    #[test]
    fn long_ttls_become_absolute_timestamps() {
        assert_eq!(exptime(Some(RELATIVE_EXPIRY_LIMIT), now()), RELATIVE_EXPIRY_LIMIT as u32);

        let ttl = RELATIVE_EXPIRY_LIMIT + 1;
        let expected = now().timestamp() as u64 + ttl;
        assert_eq!(exptime(Some(ttl), now()), expected as u32);
    }

    #[test]
    fn absolute_timestamps_saturate() {
        assert_eq!(exptime(Some(u64::MAX), now()), u32::MAX);
    }
}
