//! Test drivers shared by the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use cachet::{Driver, DriverError, DriverLabel, DriverResult, Lookup, MemoryDriver, Raw};

/// Driver that always returns errors (for error testing).
#[derive(Clone, Debug)]
pub struct FailingDriver {
    error_message: String,
}

impl FailingDriver {
    pub fn new(error_message: &str) -> Self {
        Self {
            error_message: error_message.to_string(),
        }
    }

    fn error(&self) -> DriverError {
        DriverError::internal(std::io::Error::other(self.error_message.clone()))
    }
}

#[async_trait]
impl Driver for FailingDriver {
    async fn fetch(&self, _key: &str) -> DriverResult<Lookup<Raw>> {
        Err(self.error())
    }

    async fn set(&self, _key: &str, _value: Raw, _ttl: Option<u64>) -> DriverResult<()> {
        Err(self.error())
    }

    async fn delete(&self, _key: &str) -> DriverResult<()> {
        Err(self.error())
    }

    async fn clear(&self) -> DriverResult<()> {
        Err(self.error())
    }

    fn label(&self) -> DriverLabel {
        DriverLabel::new_static("failing")
    }
}

/// One call as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Set(String, Option<u64>),
    Delete(String),
    Clear,
}

/// Memory driver that records every call with the physical key it got.
#[derive(Default)]
pub struct RecordingDriver {
    inner: MemoryDriver,
    calls: Mutex<Vec<Call>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        self.record(Call::Fetch(key.to_owned()));
        self.inner.fetch(key).await
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        self.record(Call::Set(key.to_owned(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.record(Call::Delete(key.to_owned()));
        self.inner.delete(key).await
    }

    async fn clear(&self) -> DriverResult<()> {
        self.record(Call::Clear);
        self.inner.clear().await
    }
}
