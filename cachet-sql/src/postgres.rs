//! PostgreSQL connection backed by `tokio-postgres`.

use async_trait::async_trait;
use tokio_postgres::{Client, types::ToSql};

use crate::{Dialect, SqlConnection, SqlError, SqlParam, StoredRow};

/// Wraps an already connected [`Client`].
///
/// The connection task returned by `tokio_postgres::connect` must be spawned
/// by the caller.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn bind(params: &[SqlParam]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    params
        .iter()
        .map(|param| -> Box<dyn ToSql + Sync + Send> {
            match param {
                SqlParam::Text(text) => Box::new(text.clone()),
                SqlParam::Bytes(bytes) => Box::new(bytes.clone()),
                SqlParam::Int(int) => Box::new(*int),
                SqlParam::Null => Box::new(Option::<i64>::None),
            }
        })
        .collect()
}

#[async_trait]
impl SqlConnection for PostgresConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlError> {
        let bound = bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|param| param.as_ref() as &(dyn ToSql + Sync))
            .collect();
        Ok(self.client.execute(sql, &refs).await?)
    }

    async fn query_row(&self, sql: &str, params: &[SqlParam]) -> Result<Option<StoredRow>, SqlError> {
        let bound = bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|param| param.as_ref() as &(dyn ToSql + Sync))
            .collect();
        let Some(row) = self.client.query_opt(sql, &refs).await? else {
            return Ok(None);
        };
        Ok(Some(StoredRow {
            value: row.try_get(0)?,
            expires_at: row.try_get(1)?,
        }))
    }
}
