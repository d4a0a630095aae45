//! Statement generation as seen by the connection, for every dialect.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use cachet_driver::{Driver, DriverError, Lookup};
use cachet_sql::{CacheSchema, Dialect, SqlDriver, SqlParam, StoredRow};
use common::RecordingConnection;

#[tokio::test]
async fn test_mysql_driver_emits_backticks_and_duplicate_key_upsert() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Mysql));
    let driver = SqlDriver::new(connection.clone()).await.unwrap();
    driver.set("k", Bytes::from_static(b"v"), None).await.unwrap();

    let sql = connection.sql();
    assert!(sql[0].starts_with("CREATE TABLE IF NOT EXISTS `cache`"));
    assert!(sql[1].ends_with(
        "ON DUPLICATE KEY UPDATE `cache_value` = VALUES(`cache_value`), \
         `expires_at` = VALUES(`expires_at`), `created_at` = VALUES(`created_at`)"
    ));
    assert_eq!(driver.dialect(), Dialect::Mysql);
}

#[tokio::test]
async fn test_auto_create_table_can_be_disabled() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Postgres));
    let _driver = SqlDriver::builder(connection.clone())
        .auto_create_table(false)
        .build()
        .await
        .unwrap();
    assert!(connection.recorded().is_empty());
}

#[tokio::test]
async fn test_set_binds_key_value_expiry_and_creation_time() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Postgres));
    let driver = SqlDriver::builder(connection.clone())
        .auto_create_table(false)
        .build()
        .await
        .unwrap();

    let before = chrono::Utc::now().timestamp();
    driver.set("k", Bytes::from_static(b"v"), Some(60)).await.unwrap();
    driver.set("forever", Bytes::from_static(b"v"), None).await.unwrap();

    let recorded = connection.recorded();
    let (sql, params) = &recorded[0];
    assert!(sql.contains("VALUES ($1, $2, $3, $4) ON CONFLICT (\"cache_key\")"));
    assert_eq!(params[0], SqlParam::Text("k".into()));
    assert_eq!(params[1], SqlParam::Bytes(b"v".to_vec()));
    match params[2] {
        SqlParam::Int(expiry) => assert!(expiry >= before + 60 && expiry <= before + 61),
        ref other => panic!("expected integer expiry, got {other:?}"),
    }
    assert!(matches!(&params[3], SqlParam::Text(created) if created.ends_with('Z')));

    assert_eq!(recorded[1].1[2], SqlParam::Null);
}

#[tokio::test]
async fn test_expired_row_is_deleted_on_fetch() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Sqlite));
    let driver = SqlDriver::builder(connection.clone())
        .auto_create_table(false)
        .build()
        .await
        .unwrap();
    connection.respond_with(Some(StoredRow {
        value: b"stale".to_vec(),
        expires_at: Some(chrono::Utc::now().timestamp() - 10),
    }));

    assert_eq!(driver.fetch("k").await.unwrap(), Lookup::Miss);
    assert_eq!(
        connection.sql(),
        vec![
            "SELECT \"cache_value\", \"expires_at\" FROM \"cache\" WHERE \"cache_key\" = ?".to_string(),
            "DELETE FROM \"cache\" WHERE \"cache_key\" = ?".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_live_row_is_a_hit() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Sqlite));
    let driver = SqlDriver::builder(connection.clone())
        .auto_create_table(false)
        .build()
        .await
        .unwrap();
    connection.respond_with(Some(StoredRow {
        value: b"fresh".to_vec(),
        expires_at: None,
    }));

    assert_eq!(
        driver.fetch("k").await.unwrap(),
        Lookup::Hit(Bytes::from_static(b"fresh"))
    );
}

#[tokio::test]
async fn test_overlong_keys_are_rejected_before_querying() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Mysql));
    let driver = SqlDriver::builder(connection.clone())
        .auto_create_table(false)
        .build()
        .await
        .unwrap();

    assert_eq!(driver.max_key_length(), Some(255));
    let key = "k".repeat(256);
    let err = driver.set(&key, Bytes::new(), None).await.unwrap_err();
    assert!(matches!(err, DriverError::KeyTooLong { len: 256, max: 255, .. }));
    assert!(driver.fetch(&key).await.is_err());
    assert!(connection.recorded().is_empty());

    driver.set(&"k".repeat(255), Bytes::new(), None).await.unwrap();
}

#[tokio::test]
async fn test_custom_schema() {
    let connection = Arc::new(RecordingConnection::new(Dialect::Sqlite));
    let driver = SqlDriver::builder(connection.clone())
        .schema(CacheSchema {
            table: "kv".into(),
            ..CacheSchema::default()
        })
        .build()
        .await
        .unwrap();
    driver.clear().await.unwrap();

    assert_eq!(connection.sql().last().unwrap(), "DELETE FROM \"kv\"");
}
