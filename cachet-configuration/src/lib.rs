//! Configuration support for cachet.
//!
//! Describes named stores in YAML (or any serde format), resolves driver
//! names through [`DriverFactory`] implementations and hands out memoized
//! [`Store`](cachet::Store)s through the [`Cache`] facade.
//!
//! Drivers for external services are enabled with cargo features (`sql`,
//! `redis`, `memcached`) and registered as factories holding an already
//! connected handle. Asking for one whose feature is off, or whose factory
//! was never registered, fails with [`ConfigError::BackendNotAvailable`].

mod cache;
pub mod config;
pub mod error;
pub mod factory;
mod store_factory;

pub use cache::{Cache, CacheBuilder};
pub use config::{CacheConfig, DEFAULT_STORE, StoreConfig, StoreOptions, TtlConfig};
pub use error::ConfigError;
pub use factory::{BuiltInDriverFactory, ChainDriverFactory, DriverFactory};
#[cfg(feature = "memcached")]
pub use factory::MemcachedDriverFactory;
#[cfg(feature = "redis")]
pub use factory::RedisDriverFactory;
#[cfg(feature = "sql")]
pub use factory::SqlDriverFactory;
pub use store_factory::{CacheStoreFactory, CacheStoreFactoryBuilder};
