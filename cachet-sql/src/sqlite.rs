//! SQLite connection backed by the bundled `rusqlite` client.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use rusqlite::{
    Connection, ToSql, params_from_iter,
    types::{Null, ToSqlOutput},
};

use crate::{Dialect, SqlConnection, SqlError, SqlParam, StoredRow};

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Text(text) => ToSqlOutput::from(text.as_str()),
            SqlParam::Bytes(bytes) => ToSqlOutput::from(bytes.as_slice()),
            SqlParam::Int(int) => ToSqlOutput::from(*int),
            SqlParam::Null => ToSqlOutput::from(Null),
        })
    }
}

/// Shared SQLite connection.
///
/// Statements run on the blocking pool, one at a time per connection.
#[derive(Clone)]
pub struct SqliteConnection {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Private in-memory database, gone when the last clone is dropped.
    pub fn open_in_memory() -> Result<Self, SqlError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, SqlError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqlError> + Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let guard = connection.lock().map_err(|_| SqlError::Poisoned)?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl SqlConnection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlError> {
        let sql = sql.to_owned();
        let params = params.to_vec();
        self.with_connection(move |connection| {
            let affected = connection.execute(&sql, params_from_iter(params.iter()))?;
            Ok(affected as u64)
        })
        .await
    }

    async fn query_row(&self, sql: &str, params: &[SqlParam]) -> Result<Option<StoredRow>, SqlError> {
        let sql = sql.to_owned();
        let params = params.to_vec();
        self.with_connection(move |connection| {
            let row = connection.query_row(&sql, params_from_iter(params.iter()), |row| {
                Ok(StoredRow {
                    value: row.get(0)?,
                    expires_at: row.get(1)?,
                })
            });
            match row {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(error) => Err(error.into()),
            }
        })
        .await
    }
}
