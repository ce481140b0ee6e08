// Integration tests for local-store snapshot persistence

use ledgerdesk_core::engine::PersistenceEngine;
use ledgerdesk_core::model::{Entity, Record};
use ledgerdesk_store::LocalStoreEngine;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_snapshot_survives_reopen_in_new_engine() {
    // Given: A store written through one engine
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    {
        let mut engine = LocalStoreEngine::with_snapshot(&path);
        engine.open().unwrap();
        engine
            .upsert(
                Entity::SubscriptionStatus,
                &Record::new()
                    .with("id", json!("current"))
                    .with("status", json!("active"))
                    .with("subscription", json!({"plan": "pro"}))
                    .with("cancel_at_period_end", json!(false)),
            )
            .unwrap();
    }

    // When: A fresh engine opens the same snapshot
    let mut engine = LocalStoreEngine::with_snapshot(&path);
    engine.open().unwrap();

    // Then: The row decodes as written
    let row = engine
        .get_by_id(Entity::SubscriptionStatus, "current")
        .unwrap()
        .unwrap();
    assert_eq!(row.get("status"), Some(&json!("active")));
    assert_eq!(row.get("subscription"), Some(&json!({"plan": "pro"})));
    assert_eq!(row.get("cancel_at_period_end"), Some(&json!(false)));
}

#[test]
fn test_reset_removes_snapshot_contents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let mut engine = LocalStoreEngine::with_snapshot(&path);
    engine.open().unwrap();
    engine
        .upsert(Entity::Donors, &Record::new().with("id", json!("d1")))
        .unwrap();

    engine.reset().unwrap();
    engine.close().unwrap();
    engine.open().unwrap();

    assert!(engine.list(Entity::Donors).unwrap().is_empty());
}

#[test]
fn test_ensure_database_exists_writes_empty_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh").join("store.json");
    let engine = LocalStoreEngine::with_snapshot(&path);

    engine.ensure_database_exists().unwrap();

    assert!(path.is_file());
    let content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["version"], json!(1));
}

#[test]
fn test_corrupt_snapshot_fails_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let mut engine = LocalStoreEngine::with_snapshot(&path);

    assert!(engine.open().is_err());
    assert!(!engine.is_open());
}
