// Integration tests for backup and restore of closed engines

use ledgerdesk_core::engine::PersistenceEngine;
use ledgerdesk_core::errors::ExErrorKind;
use ledgerdesk_core::model::{Entity, Record};
use ledgerdesk_store::backup::{backup_engine, restore_engine};
use ledgerdesk_store::{LocalStoreEngine, SqliteEngine};
use serde_json::json;
use tempfile::TempDir;

fn product(id: &str, name: &str) -> Record {
    Record::new().with("id", json!(id)).with("name", json!(name))
}

#[test]
fn test_sqlite_backup_then_restore_rolls_back() {
    // Given: A database with one product, backed up while closed
    let dir = TempDir::new().unwrap();
    let backup_path = dir.path().join("backups").join("ledger-backup.db");
    let mut engine = SqliteEngine::new(dir.path().join("ledger.db"));
    engine.open().unwrap();
    engine.upsert(Entity::Products, &product("p1", "Widget")).unwrap();
    engine.close().unwrap();

    let bytes = backup_engine(&engine, &backup_path).unwrap();
    assert!(bytes > 0);
    assert!(backup_path.is_file());

    // When: More data is written and the backup restored
    engine.open().unwrap();
    engine.upsert(Entity::Products, &product("p2", "Gadget")).unwrap();
    engine.close().unwrap();
    restore_engine(&engine, &backup_path).unwrap();

    // Then: Only the backed-up row remains
    engine.open().unwrap();
    let products = engine.list(Entity::Products).unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id(), Some("p1"));
}

#[test]
fn test_local_store_backup_then_restore_rolls_back() {
    let dir = TempDir::new().unwrap();
    let backup_path = dir.path().join("store-backup.json");
    let mut engine = LocalStoreEngine::with_snapshot(dir.path().join("store.json"));
    engine.open().unwrap();
    engine.upsert(Entity::Products, &product("p1", "Widget")).unwrap();
    engine.close().unwrap();

    backup_engine(&engine, &backup_path).unwrap();

    engine.open().unwrap();
    engine.delete(Entity::Products, "p1").unwrap();
    engine.close().unwrap();
    restore_engine(&engine, &backup_path).unwrap();

    engine.open().unwrap();
    let row = engine.get_by_id(Entity::Products, "p1").unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&json!("Widget")));
}

#[test]
fn test_restore_refuses_open_engine() {
    let dir = TempDir::new().unwrap();
    let backup_path = dir.path().join("ledger-backup.db");
    let mut engine = SqliteEngine::new(dir.path().join("ledger.db"));
    engine.open().unwrap();
    engine.close().unwrap();
    backup_engine(&engine, &backup_path).unwrap();

    engine.open().unwrap();
    let err = restore_engine(&engine, &backup_path).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::EngineOpen);
}

#[test]
fn test_in_memory_engine_cannot_be_backed_up() {
    let dir = TempDir::new().unwrap();
    let engine = SqliteEngine::in_memory();

    let err = backup_engine(&engine, &dir.path().join("x.db")).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::CapabilityUnavailable);
}
