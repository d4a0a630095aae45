use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cachet_driver::{
    Driver, DriverLabel, DriverResult, Lookup, Raw, ensure_key_length,
};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, trace};

use crate::{CacheSchema, Dialect, SqlConnection, SqlDriverOptions, SqlError, SqlParam};

/// Longest key accepted by the `VARCHAR(255)` key column.
pub const MAX_KEY_LENGTH: usize = 255;

/// Statements rendered once for the connection's dialect.
#[derive(Debug)]
struct Statements {
    upsert: String,
    select: String,
    delete: String,
    clear: String,
}

impl Statements {
    fn new(dialect: Dialect, schema: &CacheSchema) -> Self {
        Self {
            upsert: dialect.upsert_sql(schema),
            select: dialect.select_sql(schema),
            delete: dialect.delete_sql(schema),
            clear: dialect.clear_sql(schema),
        }
    }
}

/// Relational cache driver: one row per key in a single table.
///
/// The expiry column stores a Unix timestamp in seconds (or `NULL`). A row
/// counts as expired once that second has passed; expired rows are deleted
/// by the read that finds them.
///
/// ```no_run
/// # #[cfg(feature = "sqlite")]
/// # async fn run() -> Result<(), cachet_sql::SqlError> {
/// use std::sync::Arc;
/// use cachet_sql::{SqlDriver, SqliteConnection};
///
/// let connection = Arc::new(SqliteConnection::open("cache.db")?);
/// let driver = SqlDriver::builder(connection).build().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqlDriver {
    connection: Arc<dyn SqlConnection>,
    statements: Arc<Statements>,
    dialect: Dialect,
    label: DriverLabel,
}

impl SqlDriver {
    pub fn builder(connection: Arc<dyn SqlConnection>) -> SqlDriverBuilder {
        SqlDriverBuilder {
            connection,
            options: SqlDriverOptions::default(),
            label: DriverLabel::new_static("sql"),
        }
    }

    /// Builds a driver with default options.
    pub async fn new(connection: Arc<dyn SqlConnection>) -> Result<Self, SqlError> {
        Self::builder(connection).build().await
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn check_key(&self, key: &str) -> DriverResult<()> {
        ensure_key_length(&self.label, key, MAX_KEY_LENGTH)
    }
}

/// Builder for [`SqlDriver`].
pub struct SqlDriverBuilder {
    connection: Arc<dyn SqlConnection>,
    options: SqlDriverOptions,
    label: DriverLabel,
}

impl SqlDriverBuilder {
    pub fn options(mut self, options: SqlDriverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(mut self, schema: CacheSchema) -> Self {
        self.options.schema = schema;
        self
    }

    /// Whether to run `CREATE TABLE IF NOT EXISTS` while building. Default: on.
    pub fn auto_create_table(mut self, enabled: bool) -> Self {
        self.options.auto_create_table = enabled;
        self
    }

    pub fn label(mut self, label: impl Into<DriverLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the driver, provisioning the table first when enabled.
    pub async fn build(self) -> Result<SqlDriver, SqlError> {
        let dialect = self.connection.dialect();
        let schema = &self.options.schema;

        if self.options.auto_create_table {
            self.connection
                .execute(&dialect.create_table_sql(schema), &[])
                .await?;
            debug!(table = %schema.table, dialect = %dialect, "Cache table ready");
        }

        Ok(SqlDriver {
            statements: Arc::new(Statements::new(dialect, schema)),
            connection: self.connection,
            dialect,
            label: self.label,
        })
    }
}

#[async_trait]
impl Driver for SqlDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        self.check_key(key)?;
        let params = [SqlParam::Text(key.to_owned())];
        let row = match self
            .connection
            .query_row(&self.statements.select, &params)
            .await?
        {
            Some(row) => row,
            None => return Ok(Lookup::Miss),
        };

        if let Some(expires_at) = row.expires_at
            && expires_at < Utc::now().timestamp()
        {
            trace!(key, "Removing expired row");
            self.connection
                .execute(&self.statements.delete, &params)
                .await?;
            return Ok(Lookup::Miss);
        }

        Ok(Lookup::Hit(Bytes::from(row.value)))
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        self.check_key(key)?;
        let now = Utc::now();
        let expiry = match ttl.and_then(|ttl| i64::try_from(ttl).ok()) {
            Some(ttl) => SqlParam::Int(now.timestamp().saturating_add(ttl)),
            None => SqlParam::Null,
        };
        let params = [
            SqlParam::Text(key.to_owned()),
            SqlParam::Bytes(value.to_vec()),
            expiry,
            SqlParam::Text(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];
        self.connection
            .execute(&self.statements.upsert, &params)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.check_key(key)?;
        self.connection
            .execute(&self.statements.delete, &[SqlParam::Text(key.to_owned())])
            .await?;
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        self.connection.execute(&self.statements.clear, &[]).await?;
        Ok(())
    }

    fn label(&self) -> DriverLabel {
        self.label.clone()
    }

    fn max_key_length(&self) -> Option<usize> {
        Some(MAX_KEY_LENGTH)
    }
}
