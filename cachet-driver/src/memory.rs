//! Process-local driver backed by a concurrent map.

use std::sync::Arc;

use async_trait::async_trait;
use cachet_core::{DriverLabel, Lookup, Raw, ttl};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{Driver, DriverResult};

#[derive(Clone)]
struct Entry {
    value: Raw,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-memory driver. Entries live as long as the driver (and its clones).
///
/// Expiry is checked lazily on every read; an expired entry is removed by
/// the read that notices it. There is no eviction beyond that.
#[derive(Clone)]
pub struct MemoryDriver {
    entries: Arc<DashMap<String, Entry>>,
    label: DriverLabel,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            label: DriverLabel::new_static("memory"),
        }
    }

    /// Sets a custom label for logs and chain tier paths.
    pub fn with_label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        let now = Utc::now();
        let entry = match self.entries.get(key) {
            Some(entry) => entry.clone(),
            None => return Ok(Lookup::Miss),
        };
        if entry.is_expired(now) {
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(now));
            return Ok(Lookup::Miss);
        }
        Ok(Lookup::Hit(entry.value))
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        let expires_at = ttl::expires_at(ttl, Utc::now());
        self.entries
            .insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn label(&self) -> DriverLabel {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn expired_entry_is_removed_on_read() {
        let driver = MemoryDriver::new();
        driver.set("k", Bytes::from_static(b"v"), Some(0)).await.unwrap();
        assert_eq!(driver.len(), 1);

        assert_eq!(driver.fetch("k").await.unwrap(), Lookup::Miss);
        assert!(driver.is_empty());
    }

    #[tokio::test]
    async fn entry_without_ttl_never_expires() {
        let driver = MemoryDriver::new();
        driver.set("k", Bytes::from_static(b"v"), None).await.unwrap();
        assert_eq!(
            driver.fetch("k").await.unwrap(),
            Lookup::Hit(Bytes::from_static(b"v"))
        );
    }
}
