use serde::{Deserialize, Serialize};

/// Table and column names used by [`SqlDriver`](crate::SqlDriver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSchema {
    pub table: String,
    pub key_column: String,
    pub value_column: String,
    pub expiry_column: String,
    pub created_column: String,
}

impl Default for CacheSchema {
    fn default() -> Self {
        Self {
            table: "cache".to_owned(),
            key_column: "cache_key".to_owned(),
            value_column: "cache_value".to_owned(),
            expiry_column: "expires_at".to_owned(),
            created_column: "created_at".to_owned(),
        }
    }
}

/// Options for building a [`SqlDriver`](crate::SqlDriver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlDriverOptions {
    #[serde(flatten)]
    pub schema: CacheSchema,
    /// Create the table at construction when it doesn't exist yet.
    pub auto_create_table: bool,
}

impl Default for SqlDriverOptions {
    fn default() -> Self {
        Self {
            schema: CacheSchema::default(),
            auto_create_table: true,
        }
    }
}
