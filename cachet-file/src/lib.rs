//! Filesystem driver for cachet.
//!
//! Each key lives in its own file under a cache directory. Unreadable or
//! corrupted files are reported as misses and removed.

mod driver;
mod error;

pub use driver::{FileDriver, FileDriverBuilder};
pub use error::FileError;
