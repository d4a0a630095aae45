//! Driver contract for cachet storage backends.
//!
//! If you want to plug in your own storage, implement [`Driver`]. This crate
//! also ships the two drivers everything else builds on: the process-local
//! [`MemoryDriver`] and the tiered [`ChainDriver`].
mod driver;
pub mod chain;
pub mod error;
pub mod format;
pub mod memory;

pub use cachet_core::{DriverLabel, Lookup, Raw, Ttl, ttl};
pub use chain::{ChainDriver, ChainDriverBuilder};
pub use driver::{Driver, DriverResult};
pub use error::{DriverError, ensure_key_length};
pub use format::{FormatError, ValueFormat};
pub use memory::MemoryDriver;
