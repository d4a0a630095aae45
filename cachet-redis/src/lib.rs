//! Redis driver for cachet.
//!
//! Keys are limited to 250 bytes so the same key space works against
//! memcached as well.

pub mod driver;
pub mod error;

#[doc(inline)]
pub use crate::driver::{MAX_KEY_LENGTH, RedisDriver, RedisDriverBuilder};
pub use crate::error::Error;
