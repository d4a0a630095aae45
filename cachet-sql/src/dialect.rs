//! SQL generation per database dialect.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{CacheSchema, SqlError};

/// Database dialects the SQL driver can talk to.
///
/// The dialect decides identifier quoting, parameter placeholders, the
/// binary column type and, most importantly, the upsert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    #[serde(alias = "mariadb")]
    Mysql,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// Resolves a driver name such as `sqlite`, `mysql` or `pgsql`.
    pub fn from_name(name: &str) -> Result<Self, SqlError> {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(SqlError::UnknownDialect(name.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "pgsql",
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    pub fn quote(&self, identifier: &str) -> String {
        let quote = match self {
            Dialect::Mysql => '`',
            Dialect::Sqlite | Dialect::Postgres => '"',
        };
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(quote);
        for c in identifier.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Placeholder for the `index`-th (1-based) bound parameter.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite | Dialect::Mysql => "?".to_owned(),
        }
    }

    fn binary_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "BLOB",
            Dialect::Mysql => "LONGBLOB",
            Dialect::Postgres => "BYTEA",
        }
    }

    pub fn create_table_sql(&self, schema: &CacheSchema) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table} ({key} VARCHAR(255) PRIMARY KEY, {value} {binary} NOT NULL, {expiry} BIGINT NULL, {created} VARCHAR(64) NOT NULL)",
            table = self.quote(&schema.table),
            key = self.quote(&schema.key_column),
            value = self.quote(&schema.value_column),
            binary = self.binary_type(),
            expiry = self.quote(&schema.expiry_column),
            created = self.quote(&schema.created_column),
        )
    }

    /// Insert-or-replace statement binding key, value, expiry and creation
    /// time, in that order.
    pub fn upsert_sql(&self, schema: &CacheSchema) -> String {
        let key = self.quote(&schema.key_column);
        let value = self.quote(&schema.value_column);
        let expiry = self.quote(&schema.expiry_column);
        let created = self.quote(&schema.created_column);
        let insert = format!(
            "INSERT INTO {table} ({key}, {value}, {expiry}, {created}) VALUES ({p1}, {p2}, {p3}, {p4})",
            table = self.quote(&schema.table),
            p1 = self.placeholder(1),
            p2 = self.placeholder(2),
            p3 = self.placeholder(3),
            p4 = self.placeholder(4),
        );
        match self {
            Dialect::Sqlite | Dialect::Postgres => format!(
                "{insert} ON CONFLICT ({key}) DO UPDATE SET {value} = excluded.{value}, {expiry} = excluded.{expiry}, {created} = excluded.{created}"
            ),
            Dialect::Mysql => format!(
                "{insert} ON DUPLICATE KEY UPDATE {value} = VALUES({value}), {expiry} = VALUES({expiry}), {created} = VALUES({created})"
            ),
        }
    }

    /// Reads value and expiry for one key.
    pub fn select_sql(&self, schema: &CacheSchema) -> String {
        format!(
            "SELECT {value}, {expiry} FROM {table} WHERE {key} = {p1}",
            value = self.quote(&schema.value_column),
            expiry = self.quote(&schema.expiry_column),
            table = self.quote(&schema.table),
            key = self.quote(&schema.key_column),
            p1 = self.placeholder(1),
        )
    }

    pub fn delete_sql(&self, schema: &CacheSchema) -> String {
        format!(
            "DELETE FROM {table} WHERE {key} = {p1}",
            table = self.quote(&schema.table),
            key = self.quote(&schema.key_column),
            p1 = self.placeholder(1),
        )
    }

    pub fn clear_sql(&self, schema: &CacheSchema) -> String {
        format!("DELETE FROM {}", self.quote(&schema.table))
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::from_name(s)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
