//! Memcached driver for cachet.
//!
//! The `memcache` client is synchronous, so every call runs on tokio's
//! blocking pool.
//!
//! ```no_run
//! use cachet_memcached::MemcachedDriver;
//!
//! let driver = MemcachedDriver::builder()
//!     .server("memcache://127.0.0.1:11211")
//!     .build()?;
//! # Ok::<(), cachet_memcached::Error>(())
//! ```

pub mod driver;
pub mod error;

#[doc(inline)]
pub use crate::driver::{MAX_KEY_LENGTH, MemcachedDriver, MemcachedDriverBuilder};
pub use crate::error::Error;
