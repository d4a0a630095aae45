//! Database access seam for the SQL driver.
//!
//! The driver never opens connections itself: it is handed something that
//! implements [`SqlConnection`]. SQLite and PostgreSQL implementations ship
//! behind the `sqlite` and `postgres` features; any other client (a MySQL
//! pool, a test double) only has to run a statement and return one row.

use async_trait::async_trait;

use crate::{Dialect, SqlError};

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    /// SQL `NULL` for the nullable expiry column.
    Null,
}

/// Value and expiry of a stored entry, as returned by a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub value: Vec<u8>,
    /// Unix timestamp in seconds, `None` when the entry never expires.
    pub expires_at: Option<i64>,
}

#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// Dialect the generated SQL must be written in.
    fn dialect(&self) -> Dialect;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlError>;

    /// Runs a `SELECT value, expiry ...` statement and returns its first row.
    async fn query_row(&self, sql: &str, params: &[SqlParam]) -> Result<Option<StoredRow>, SqlError>;
}

#[async_trait]
impl<C: SqlConnection + ?Sized> SqlConnection for std::sync::Arc<C> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlError> {
        (**self).execute(sql, params).await
    }

    async fn query_row(&self, sql: &str, params: &[SqlParam]) -> Result<Option<StoredRow>, SqlError> {
        (**self).query_row(sql, params).await
    }
}
