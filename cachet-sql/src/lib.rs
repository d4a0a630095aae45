//! Relational cache driver for cachet.
//!
//! Entries live in a single table keyed by the cache key. SQL is generated
//! per [`Dialect`] (SQLite, MySQL, PostgreSQL), so the upsert that makes
//! `set` race-free matches what each database understands.

mod connection;
mod dialect;
mod driver;
mod error;
#[cfg(feature = "postgres")]
mod postgres;
mod schema;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use connection::{SqlConnection, SqlParam, StoredRow};
pub use dialect::Dialect;
pub use driver::{MAX_KEY_LENGTH, SqlDriver, SqlDriverBuilder};
pub use error::SqlError;
#[cfg(feature = "postgres")]
pub use postgres::PostgresConnection;
pub use schema::{CacheSchema, SqlDriverOptions};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
