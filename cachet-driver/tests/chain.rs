//! Integration tests for ChainDriver.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use cachet_driver::{ChainDriver, Driver, DriverError, Lookup, MemoryDriver};
use common::{CountingDriver, FailingDriver, init_tracing};
use indexmap::IndexMap;

fn value(s: &'static str) -> Bytes {
    Bytes::from_static(s.as_bytes())
}

fn two_tiers() -> (ChainDriver, MemoryDriver, MemoryDriver) {
    let l1 = MemoryDriver::new().with_label("l1");
    let l2 = MemoryDriver::new().with_label("l2");
    let chain = ChainDriver::builder()
        .tier(l1.clone())
        .tier(l2.clone())
        .build()
        .unwrap();
    (chain, l1, l2)
}

#[test]
fn test_empty_chain_is_rejected() {
    let result = ChainDriver::builder().build();
    assert!(matches!(result, Err(DriverError::EmptyChain)));
    assert!(matches!(ChainDriver::new(vec![]), Err(DriverError::EmptyChain)));
}

#[tokio::test]
async fn test_hit_in_lower_tier_is_promoted() {
    let (chain, l1, l2) = two_tiers();
    l2.set("user", value("alice"), Some(3600)).await.unwrap();
    assert_eq!(l1.fetch("user").await.unwrap(), Lookup::Miss);

    let got = chain.get("user").await.unwrap();
    assert_eq!(got, Some(value("alice")));
    assert_eq!(l1.fetch("user").await.unwrap(), Lookup::Hit(value("alice")));
}

#[tokio::test]
async fn test_promotion_only_touches_tiers_above_the_hit() {
    let l1 = Arc::new(CountingDriver::new(MemoryDriver::new()));
    let l2 = Arc::new(CountingDriver::new(MemoryDriver::new()));
    let l3 = Arc::new(CountingDriver::new(MemoryDriver::new()));
    let chain = ChainDriver::builder()
        .shared_tier(l1.clone())
        .shared_tier(l2.clone())
        .shared_tier(l3.clone())
        .build()
        .unwrap();

    l2.set("k", value("v"), None).await.unwrap();
    let writes_before = (l1.write_count(), l2.write_count(), l3.write_count());

    assert!(chain.fetch("k").await.unwrap().is_hit());

    assert_eq!(l1.write_count(), writes_before.0 + 1);
    assert_eq!(l2.write_count(), writes_before.1);
    assert_eq!(l3.write_count(), writes_before.2);
    assert_eq!(l3.fetch_count(), 0);
}

#[tokio::test]
async fn test_top_tier_hit_does_not_read_lower_tiers() {
    let l1 = Arc::new(CountingDriver::new(MemoryDriver::new()));
    let l2 = Arc::new(CountingDriver::new(MemoryDriver::new()));
    let chain = ChainDriver::new(vec![l1.clone() as Arc<dyn Driver>, l2.clone()]).unwrap();

    l1.set("k", value("v"), None).await.unwrap();
    assert!(chain.fetch("k").await.unwrap().is_hit());
    assert_eq!(l2.fetch_count(), 0);
}

#[tokio::test]
async fn test_miss_everywhere() {
    let (chain, _, _) = two_tiers();
    assert_eq!(chain.fetch("nope").await.unwrap(), Lookup::Miss);
    assert!(!chain.has("nope").await.unwrap());
}

#[tokio::test]
async fn test_set_fans_out_to_every_tier() {
    let (chain, l1, l2) = two_tiers();
    chain.set("k", value("v"), None).await.unwrap();

    assert_eq!(l1.fetch("k").await.unwrap(), Lookup::Hit(value("v")));
    assert_eq!(l2.fetch("k").await.unwrap(), Lookup::Hit(value("v")));
}

#[tokio::test]
async fn test_delete_and_clear_fan_out() {
    let (chain, l1, l2) = two_tiers();
    chain.set("a", value("1"), None).await.unwrap();
    chain.set("b", value("2"), None).await.unwrap();

    chain.delete("a").await.unwrap();
    assert!(!l1.has("a").await.unwrap());
    assert!(!l2.has("a").await.unwrap());

    chain.clear().await.unwrap();
    assert!(l1.is_empty());
    assert!(l2.is_empty());
}

#[tokio::test]
async fn test_has_short_circuits_without_promotion() {
    let (chain, l1, l2) = two_tiers();
    l2.set("k", value("v"), None).await.unwrap();

    assert!(chain.has("k").await.unwrap());
    assert!(!l1.has("k").await.unwrap());
}

#[tokio::test]
async fn test_failing_write_tier_does_not_stop_propagation() {
    init_tracing();
    let l2 = MemoryDriver::new();
    let chain = ChainDriver::builder()
        .tier(FailingDriver::new("l1 down"))
        .tier(l2.clone())
        .build()
        .unwrap();

    let result = chain.set("k", value("v"), None).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_backend_failure());
    assert_eq!(l2.fetch("k").await.unwrap(), Lookup::Hit(value("v")));
}

#[tokio::test]
async fn test_failing_read_tier_falls_through_to_next() {
    init_tracing();
    let l2 = MemoryDriver::new();
    l2.set("k", value("v"), None).await.unwrap();
    let chain = ChainDriver::builder()
        .tier(FailingDriver::new("l1 down"))
        .tier(l2)
        .build()
        .unwrap();

    assert_eq!(chain.fetch("k").await.unwrap(), Lookup::Hit(value("v")));
}

#[tokio::test]
async fn test_read_error_surfaces_when_nothing_hits() {
    let chain = ChainDriver::builder()
        .tier(FailingDriver::new("l1 down"))
        .tier(MemoryDriver::new())
        .build()
        .unwrap();

    let err = chain.fetch("k").await.unwrap_err();
    assert_eq!(err.to_string(), "l1 down");
}

#[tokio::test]
async fn test_batch_operations_follow_single_key_semantics() {
    let (chain, l1, l2) = two_tiers();
    let mut entries = IndexMap::new();
    entries.insert("a".to_string(), value("1"));
    entries.insert("b".to_string(), value("2"));
    chain.set_multiple(entries, None).await.unwrap();
    assert!(l1.has("a").await.unwrap() && l2.has("b").await.unwrap());

    l1.clear().await.unwrap();
    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let found = chain.get_multiple(&keys).await.unwrap();
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec![
            ("a".to_string(), Some(value("1"))),
            ("b".to_string(), Some(value("2"))),
            ("c".to_string(), None),
        ]
    );
    // Batch reads promote per key.
    assert!(l1.has("a").await.unwrap());

    chain.delete_multiple(&keys).await.unwrap();
    assert!(l1.is_empty() && l2.is_empty());
}

#[tokio::test]
async fn test_key_length_ceiling_is_the_tightest_tier() {
    let chain = ChainDriver::builder()
        .tier(CountingDriver::new(MemoryDriver::new()))
        .tier(CountingDriver::new(MemoryDriver::new()).with_max_key_length(255))
        .tier(CountingDriver::new(MemoryDriver::new()).with_max_key_length(250))
        .build()
        .unwrap();
    assert_eq!(chain.max_key_length(), Some(250));

    let unbounded = ChainDriver::builder().tier(MemoryDriver::new()).build().unwrap();
    assert_eq!(unbounded.max_key_length(), None);
}

#[tokio::test]
async fn test_nested_chains() {
    let inner_leaf = MemoryDriver::new();
    let inner = ChainDriver::builder()
        .label("inner")
        .tier(inner_leaf.clone())
        .build()
        .unwrap();
    let top = MemoryDriver::new();
    let outer = ChainDriver::builder()
        .tier(top.clone())
        .tier(inner)
        .build()
        .unwrap();

    inner_leaf.set("k", value("deep"), None).await.unwrap();
    assert_eq!(outer.get("k").await.unwrap(), Some(value("deep")));
    assert!(top.has("k").await.unwrap());
}
