//! Metrics declaration and recording.
//!
//! Counters carry a `namespace` label; stores without a namespace report
//! an empty label.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of store reads that found a value.
    pub static ref STORE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_store_hit_total",
            "Total number of store reads that found a value."
        );
        "cachet_store_hit_total"
    };
    /// Track number of store reads that found nothing.
    pub static ref STORE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_store_miss_total",
            "Total number of store reads that found nothing."
        );
        "cachet_store_miss_total"
    };
    /// Track number of keys written through a store.
    pub static ref STORE_WRITE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_store_write_total",
            "Total number of keys written through a store."
        );
        "cachet_store_write_total"
    };
    /// Track number of store writes the backend failed.
    pub static ref STORE_WRITE_ERRORS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cachet_store_write_errors_total",
            "Total number of store writes the backend failed."
        );
        "cachet_store_write_errors_total"
    };
}

/// Record read outcomes for a namespace.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_reads(namespace: &str, hits: u64, misses: u64) {
    if hits > 0 {
        metrics::counter!(*STORE_HIT_COUNTER, "namespace" => namespace.to_owned()).increment(hits);
    }
    if misses > 0 {
        metrics::counter!(*STORE_MISS_COUNTER, "namespace" => namespace.to_owned())
            .increment(misses);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_reads(_namespace: &str, _hits: u64, _misses: u64) {}

/// Record a write of `keys` keys and whether the backend accepted it.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(namespace: &str, keys: u64, ok: bool) {
    metrics::counter!(*STORE_WRITE_COUNTER, "namespace" => namespace.to_owned()).increment(keys);
    if !ok {
        metrics::counter!(*STORE_WRITE_ERRORS_COUNTER, "namespace" => namespace.to_owned())
            .increment(1);
    }
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_namespace: &str, _keys: u64, _ok: bool) {}
