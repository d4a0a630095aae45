//! Test drivers shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cachet_driver::{Driver, DriverError, DriverLabel, DriverResult, Lookup, Raw};

/// Routes driver logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

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

/// Wraps a driver and counts calls, so tests can assert which tiers were
/// touched.
pub struct CountingDriver<D> {
    inner: D,
    pub fetches: AtomicUsize,
    pub writes: AtomicUsize,
    max_key_length: Option<usize>,
}

impl<D> CountingDriver<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            max_key_length: None,
        }
    }

    pub fn with_max_key_length(mut self, max: usize) -> Self {
        self.max_key_length = Some(max);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: Driver> Driver for CountingDriver<D> {
    async fn fetch(&self, key: &str) -> DriverResult<Lookup<Raw>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(key).await
    }

    async fn set(&self, key: &str, value: Raw, ttl: Option<u64>) -> DriverResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> DriverResult<()> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> DriverResult<()> {
        self.inner.clear().await
    }

    fn label(&self) -> DriverLabel {
        self.inner.label()
    }

    fn max_key_length(&self) -> Option<usize> {
        self.max_key_length
    }
}
