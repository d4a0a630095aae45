//! Redis driver implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cachet_driver::{
    Driver, DriverLabel, DriverResult, Lookup, Raw, ensure_key_length,
};
use indexmap::IndexMap;
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Longest key accepted by this driver, in bytes.
pub const MAX_KEY_LENGTH: usize = 250;

/// Redis cache driver based on redis-rs crate.
///
/// This struct provides Redis as a storage [`Driver`] for cachet.
/// It uses a [`ConnectionManager`] for asynchronous network interaction.
///
/// Entries with a TTL are written with `SET .. EX`; batch writes use `MSET`
/// followed by one `EXPIRE` per key inside a `MULTI` block. Redis counts TTL
/// in whole seconds, so a zero TTL is rounded up to one second.
///
/// `clear` runs `FLUSHDB` and wipes the whole logical database.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisDriver {
    client: Option<Client>,
    connection: Arc<OnceCell<ConnectionManager>>,
    label: DriverLabel,
}

impl RedisDriver {
    /// Creates new RedisDriver builder with default settings.
    #[must_use]
    pub fn builder() -> RedisDriverBuilder {
        RedisDriverBuilder::default()
    }

    /// Wraps an already established connection.
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self {
            client: None,
            connection: Arc::new(OnceCell::new_with(Some(connection))),
            label: DriverLabel::new_static("redis"),
        }
    }

    /// Sets a custom label for logs and chain tier paths.
    pub fn with_label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<ConnectionManager, Error> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| async {
                trace!("Initialize new redis connection manager");
                let client = self.client.as_ref().ok_or(Error::MissingClient)?;
                client.get_connection_manager().await.map_err(Error::from)
            })
            .await?;
        Ok(manager.clone())
    }

    fn check_key(&self, key: &str) -> DriverResult<()> {
        ensure_key_length(&self.label, key, MAX_KEY_LENGTH)
    }
}

/// Redis only accepts positive expirations.
fn expire_seconds(ttl: u64) -> u64 {
    ttl.max(1)
}

/// Part of builder pattern implementation for RedisDriver.
pub struct RedisDriverBuilder {
    connection_info: String,
    label: DriverLabel,
}

impl Default for RedisDriverBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            label: DriverLabel::new_static("redis"),
        }
    }
}

impl RedisDriverBuilder {
    /// Set connection info (host, port, database, etc.) for RedisDriver.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set a custom label for this driver.
    pub fn label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Create new instance of Redis driver with passed settings.
    ///
    /// Only the URL is validated here, the connection opens on first use.
    pub fn build(self) -> Result<RedisDriver, Error> {
        Ok(RedisDriver {
            client: Some(Client::open(self.connection_info)?),
            connection: Arc::new(OnceCell::new()),
            label: self.label,
        })
    }
}

#[async_trait]
impl Driver for RedisDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        self.check_key(key)?;
        let mut con = self.connection().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(match value {
            Some(value) => Lookup::Hit(Bytes::from(value)),
            None => Lookup::Miss,
        })
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        self.check_key(key)?;
        let mut con = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value.as_ref());
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(expire_seconds(ttl));
        }
        cmd.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.check_key(key)?;
        let mut con = self.connection().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<i64>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn fetch_multiple(&self, keys: &[String]) -> DriverResult<IndexMap<String, Lookup<Raw>>> {
        if keys.is_empty() {
            return Ok(IndexMap::new());
        }
        for key in keys {
            self.check_key(key)?;
        }
        let mut con = self.connection().await?;
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(keys
            .iter()
            .cloned()
            .zip(values)
            .map(|(key, value)| {
                let lookup = match value {
                    Some(value) => Lookup::Hit(Bytes::from(value)),
                    None => Lookup::Miss,
                };
                (key, lookup)
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
        let mut con = self.connection().await?;

        // Pipeline: MSET + one EXPIRE per key, applied atomically
        let mut pipe = redis::pipe();
        pipe.atomic();
        let mset = pipe.cmd("MSET");
        for (key, value) in &entries {
            mset.arg(key).arg(value.as_ref());
        }
        mset.ignore();
        if let Some(ttl) = ttl {
            for key in entries.keys() {
                pipe.cmd("EXPIRE")
                    .arg(key)
                    .arg(expire_seconds(ttl))
                    .ignore();
            }
        }
        pipe.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn delete_multiple(&self, keys: &[String]) -> DriverResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        for key in keys {
            self.check_key(key)?;
        }
        let mut con = self.connection().await?;
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<i64>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn has(&self, key: &str) -> DriverResult<bool> {
        self.check_key(key)?;
        let mut con = self.connection().await?;
        let exists: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(exists > 0)
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
    use super::*;

    #[test]
    fn zero_ttl_rounds_up_to_one_second() {
        assert_eq!(expire_seconds(0), 1);
        assert_eq!(expire_seconds(1), 1);
        assert_eq!(expire_seconds(3600), 3600);
    }

    #[test]
    fn build_validates_url_without_connecting() {
        assert!(RedisDriver::builder().server("redis://127.0.0.1:1/").build().is_ok());
        assert!(RedisDriver::builder().server("not a url").build().is_err());
    }

    #[tokio::test]
    async fn overlong_keys_fail_before_connecting() {
        let driver = RedisDriver::builder()
            .server("redis://127.0.0.1:1/")
            .build()
            .unwrap();
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        let err = driver.fetch(&key).await.unwrap_err();
        assert!(matches!(
            err,
            cachet_driver::DriverError::KeyTooLong { max: MAX_KEY_LENGTH, .. }
        ));
    }
}
