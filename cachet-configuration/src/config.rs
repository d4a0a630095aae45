//! Serializable configuration of named stores.

use std::{path::PathBuf, time::Duration};

use cachet::{Ttl, ValueFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the store used when none is given.
pub const DEFAULT_STORE: &str = "default";

fn default_store_name() -> String {
    DEFAULT_STORE.to_owned()
}

fn default_driver() -> String {
    "memory".to_owned()
}

/// Top-level cache configuration.
///
/// ```yaml
/// default: app
/// stores:
///   app:
///     driver: chain
///     namespace: app
///     default_ttl: 10m
///     options:
///       stores: [memory, file]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// Store used by the shortcuts on [`Cache`](crate::Cache).
    #[serde(default = "default_store_name")]
    pub default: String,
    /// Named stores, in declaration order.
    #[serde(default)]
    pub stores: IndexMap<String, StoreConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default: default_store_name(),
            stores: IndexMap::new(),
        }
    }
}

impl CacheConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Adds a memory-backed `default` store unless one is configured.
    pub fn with_default_store(mut self) -> Self {
        self.stores
            .entry(DEFAULT_STORE.to_owned())
            .or_insert_with(|| StoreConfig::for_driver("memory"));
        self
    }
}

/// Configuration of one named store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StoreConfig {
    /// Driver name, resolved through the registered driver factories.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Key prefix. Empty means none.
    #[serde(default)]
    pub namespace: String,
    /// TTL for writes that don't pass one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<TtlConfig>,
    /// How values are serialized.
    #[serde(default)]
    pub format: ValueFormat,
    /// Driver specific options.
    #[serde(default)]
    pub options: StoreOptions,
}

impl StoreConfig {
    /// A store using `driver` with every other setting left at its default.
    pub fn for_driver(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            namespace: String::new(),
            default_ttl: None,
            format: ValueFormat::default(),
            options: StoreOptions::default(),
        }
    }

    /// The default TTL as the store understands it.
    pub fn ttl(&self) -> Option<Ttl> {
        self.default_ttl.map(Ttl::from)
    }
}

/// A TTL written either as whole seconds or as a humantime string.
///
/// ```yaml
/// default_ttl: 300
/// default_ttl: 5m
/// default_ttl: 1h 30m
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TtlConfig {
    /// Plain seconds.
    Seconds(u64),
    /// Human readable duration.
    Human(#[serde(with = "humantime_serde")] Duration),
}

impl From<TtlConfig> for Ttl {
    fn from(ttl: TtlConfig) -> Self {
        match ttl {
            TtlConfig::Seconds(seconds) => Ttl::Seconds(seconds),
            TtlConfig::Human(duration) => Ttl::from(duration),
        }
    }
}

/// Options understood by the built-in driver factories.
///
/// Every field is optional; factories fall back to their own defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoreOptions {
    /// Cache directory of the `file` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Table of the `sql` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Key column of the `sql` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
    /// Value column of the `sql` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    /// Expiry column of the `sql` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_column: Option<String>,
    /// Creation time column of the `sql` driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_column: Option<String>,
    /// Whether the `sql` driver creates its table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_create_table: Option<bool>,
    /// SQL dialect the connection is expected to speak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    /// Tier driver names of the `chain` driver, closest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stores: Vec<String>,
    /// Label for logs and chain tier paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
