mod common;

use std::sync::Arc;

use cachet::{CacheError, CacheItem, MemoryDriver, Store, Ttl};
use chrono::{TimeDelta, Utc};
use common::{Call, FailingDriver, RecordingDriver};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_get_item_reports_hit_and_miss() {
    let store = Store::builder(MemoryDriver::new()).namespace("items").build();
    store.set("known", "value", None).await.unwrap();
    let pool = store.pool::<String>();

    let item = pool.get_item("known").await.unwrap();
    assert!(item.is_hit());
    assert_eq!(item.get().map(String::as_str), Some("value"));

    let item = pool.get_item("unknown").await.unwrap();
    assert!(!item.is_hit());
    assert_eq!(item.get(), None);
    assert_eq!(item.key(), "unknown");
}

#[tokio::test]
async fn test_stored_none_comes_back_as_a_hit() {
    let pool = Store::new(MemoryDriver::new()).pool::<Option<u8>>();
    let mut item = CacheItem::new("none");
    item.set(None);
    pool.save(&item).await.unwrap();

    let item = pool.get_item("none").await.unwrap();
    assert!(item.is_hit());
    assert_eq!(item.into_value(), Some(None));
}

#[tokio::test]
async fn test_save_converts_absolute_expiry_to_ttl() {
    let driver = Arc::new(RecordingDriver::new());
    let pool = Store::builder(driver.clone())
        .default_ttl(Ttl::Seconds(60))
        .build()
        .pool::<u32>();

    let mut item = CacheItem::new("later");
    item.set(1)
        .expires_at(Some(Utc::now() + TimeDelta::seconds(100)));
    pool.save(&item).await.unwrap();

    let mut past = CacheItem::new("past");
    past.set(2)
        .expires_at(Some(Utc::now() - TimeDelta::seconds(100)));
    pool.save(&past).await.unwrap();

    let mut plain = CacheItem::new("plain");
    plain.set(3);
    pool.save(&plain).await.unwrap();

    let ttls: Vec<_> = driver
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Set(_, ttl) => ttl,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert!(matches!(ttls[0], Some(99 | 100)));
    assert_eq!(ttls[1], Some(0));
    assert_eq!(ttls[2], Some(60));
}

#[tokio::test]
async fn test_commit_flushes_in_insertion_order_and_empties_buffer() {
    let driver = Arc::new(RecordingDriver::new());
    let mut pool = Store::new(driver.clone()).pool::<u32>();

    for (key, value) in [("b", 1), ("a", 2), ("b", 3)] {
        let mut item = CacheItem::new(key);
        item.set(value);
        pool.save_deferred(item).unwrap();
    }
    assert_eq!(pool.deferred_len(), 2);
    assert!(driver.calls().is_empty());

    assert!(pool.commit().await);
    assert_eq!(pool.deferred_len(), 0);
    assert_eq!(
        driver.calls(),
        vec![Call::Set("b".into(), None), Call::Set("a".into(), None)]
    );
    assert_eq!(pool.get_item("b").await.unwrap().into_value(), Some(3));
}

#[tokio::test]
async fn test_commit_reports_failure_and_still_empties_buffer() {
    let mut pool = Store::new(FailingDriver::new("disk full")).pool::<u32>();
    let mut item = CacheItem::new("k");
    item.set(1);
    pool.save_deferred(item).unwrap();

    assert!(!pool.commit().await);
    assert_eq!(pool.deferred_len(), 0);
}

#[tokio::test]
async fn test_save_surfaces_backend_failures() {
    let pool = Store::new(FailingDriver::new("disk full")).pool::<u32>();
    let mut item = CacheItem::new("k");
    item.set(1);

    let err = pool.save(&item).await.unwrap_err();
    assert!(matches!(err, CacheError::Save { ref key, .. } if key == "k"));

    let empty = CacheItem::new("empty");
    assert!(matches!(
        pool.save(&empty).await,
        Err(CacheError::EmptyItem(_))
    ));
}

#[tokio::test]
async fn test_delete_and_clear_drop_deferred_items() {
    let store = Store::new(MemoryDriver::new());
    store.set("stored", &9u32, None).await.unwrap();
    let mut pool = store.pool::<u32>();

    for key in ["x", "y", "z"] {
        let mut item = CacheItem::new(key);
        item.set(1);
        pool.save_deferred(item).unwrap();
    }
    assert!(pool.delete_item("x").await.unwrap());
    assert!(pool.delete_items(["y", "stored"]).await.unwrap());
    assert_eq!(pool.deferred_len(), 1);
    assert!(!pool.has_item("stored").await.unwrap());

    assert!(pool.clear().await.unwrap());
    assert_eq!(pool.deferred_len(), 0);
    assert!(pool.commit().await);
    assert!(!pool.has_item("z").await.unwrap());
}

#[tokio::test]
async fn test_get_items_in_caller_order() {
    let store = Store::new(MemoryDriver::new());
    store.set("a", &1u32, None).await.unwrap();
    let pool = store.pool::<u32>();

    let items = pool.get_items(["missing", "a"]).await.unwrap();
    assert_eq!(items.keys().collect::<Vec<_>>(), ["missing", "a"]);
    assert!(!items["missing"].is_hit());
    assert_eq!(items["a"].get(), Some(&1));
}

#[tokio::test]
async fn test_deferred_items_are_validated() {
    let mut pool = Store::new(MemoryDriver::new()).pool::<u32>();
    let mut item = CacheItem::new("bad:key");
    item.set(1);
    assert!(matches!(
        pool.save_deferred(item),
        Err(CacheError::InvalidKey { .. })
    ));
}
