//! Connection double recording every statement it is asked to run.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use cachet_sql::{Dialect, SqlConnection, SqlError, SqlParam, StoredRow};

pub struct RecordingConnection {
    dialect: Dialect,
    pub statements: Mutex<Vec<(String, Vec<SqlParam>)>>,
    row: Mutex<Option<StoredRow>>,
}

impl RecordingConnection {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            statements: Mutex::new(Vec::new()),
            row: Mutex::new(None),
        }
    }

    /// Row returned by the next selects.
    pub fn respond_with(&self, row: Option<StoredRow>) {
        *self.row.lock().unwrap() = row;
    }

    pub fn recorded(&self) -> Vec<(String, Vec<SqlParam>)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.recorded().into_iter().map(|(sql, _)| sql).collect()
    }
}

#[async_trait]
impl SqlConnection for RecordingConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, SqlError> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_owned(), params.to_vec()));
        Ok(1)
    }

    async fn query_row(&self, sql: &str, params: &[SqlParam]) -> Result<Option<StoredRow>, SqlError> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_owned(), params.to_vec()));
        Ok(self.row.lock().unwrap().clone())
    }
}
