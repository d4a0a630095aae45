#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Error types for cache operations.
///
/// Defines [`CacheError`] which covers:
/// - Invalid logical keys
/// - Driver and serialization failures
/// - Item pool save failures
pub mod error;

/// Metrics collection for store observability.
///
/// When the `metrics` feature is enabled, stores count hits, misses,
/// writes and failed writes per namespace.
pub mod metrics;

mod pool;
mod store;

pub use error::{CacheError, CacheResult};
pub use pool::{CacheItem, ItemPool};
pub use store::{RESERVED_CHARACTERS, Store, StoreBuilder, validate_key};

pub use cachet_driver::{
    ChainDriver, ChainDriverBuilder, Driver, DriverError, DriverLabel, DriverResult, FormatError,
    Lookup, MemoryDriver, Raw, Ttl, ValueFormat, ensure_key_length, ttl,
};

/// The `cachet` prelude.
///
/// ```rust
/// use cachet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{CacheError, CacheItem, Driver, ItemPool, Lookup, Store, Ttl};
}
