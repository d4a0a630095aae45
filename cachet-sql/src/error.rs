use cachet_driver::DriverError;
use thiserror::Error;

/// Errors raised by the SQL driver and its connections.
#[derive(Debug, Error)]
pub enum SqlError {
    /// An error from the bundled SQLite client.
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error from the PostgreSQL client.
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The dialect name is not one of sqlite, mysql or pgsql.
    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// A connection lock was poisoned by a panicking thread.
    #[error("SQL connection lock poisoned")]
    Poisoned,

    /// Blocking database task failed to complete.
    #[error("SQL task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Error reported by a caller-provided connection.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl SqlError {
    /// Whether the underlying connection is gone, as opposed to a failed
    /// statement.
    pub fn is_connection_closed(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            SqlError::Postgres(error) => error.is_closed(),
            _ => false,
        }
    }
}

impl From<SqlError> for DriverError {
    fn from(error: SqlError) -> Self {
        if error.is_connection_closed() {
            DriverError::connection(error)
        } else {
            DriverError::internal(error)
        }
    }
}
