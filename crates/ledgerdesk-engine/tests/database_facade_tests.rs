#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for the Database facade

use ledgerdesk_core::config::{LedgerConfig, StoreConfig};
use ledgerdesk_core::engine::BackendKind;
use ledgerdesk_core::errors::ExErrorKind;
use ledgerdesk_core::model::{Entity, Record};
use ledgerdesk_engine::Database;
use serde_json::json;
use tempfile::TempDir;

fn configs(dir: &TempDir) -> Vec<StoreConfig> {
    vec![
        StoreConfig::sqlite(dir.path().join("ledger.db")),
        StoreConfig::local_store(Some(dir.path().join("ledger.json"))),
    ]
}

#[test]
fn test_system_config_singleton_lifecycle() {
    let dir = TempDir::new().unwrap();
    for config in configs(&dir) {
        let mut db = Database::from_config(&config);
        db.open().unwrap();

        // Given: No settings yet
        assert!(db.get_system_config("system-config").unwrap().is_none());

        // When: Settings are written
        db.put_system_config(
            &Record::new()
                .with("id", json!("system-config"))
                .with("organization_name", json!("Casa Azul"))
                .with("require_auth", json!(true))
                .with("sheet_ids", json!({"2024": "abc"})),
        )
        .unwrap();

        // Then: They read back decoded
        let cfg = db.get_system_config("system-config").unwrap().unwrap();
        assert_eq!(cfg.get("require_auth"), Some(&json!(true)), "{}", config.backend);
        assert_eq!(cfg.get("sheet_ids"), Some(&json!({"2024": "abc"})));

        // And: Clearing removes them
        db.clear_system_config().unwrap();
        assert!(db.get_system_config("system-config").unwrap().is_none());
    }
}

#[test]
fn test_update_transaction_fields_patches_one_column() {
    let dir = TempDir::new().unwrap();
    for config in configs(&dir) {
        let mut db = Database::from_config(&config);
        db.open().unwrap();
        db.upsert_transaction(
            &Record::new()
                .with("id", json!("t1"))
                .with("value", json!(100))
                .with("status", json!("pending")),
        )
        .unwrap();

        db.update_transaction_fields("t1", &Record::new().with("status", json!("paid")))
            .unwrap();

        let tx = db.get_transaction_by_id("t1").unwrap().unwrap();
        assert_eq!(tx.get("status"), Some(&json!("paid")), "{}", config.backend);
        assert_eq!(tx.get("value"), Some(&json!(100)));
    }
}

#[test]
fn test_subscription_status_round_trip() {
    let dir = TempDir::new().unwrap();
    for config in configs(&dir) {
        let mut db = Database::from_config(&config);
        db.open().unwrap();

        db.put_subscription_status(
            &Record::new()
                .with("id", json!("current"))
                .with("status", json!("trialing"))
                .with("cancel_at_period_end", json!(true)),
        )
        .unwrap();

        let status = db.get_subscription_status("current").unwrap().unwrap();
        assert_eq!(status.get("status"), Some(&json!("trialing")));
        assert_eq!(status.get("cancel_at_period_end"), Some(&json!(true)));
    }
}

#[test]
fn test_backup_restore_reopens_open_database() {
    // Given: An open database with one client and a backup of it
    let dir = TempDir::new().unwrap();
    let backup = dir.path().join("backup.db");
    let mut db = Database::from_config(&StoreConfig::sqlite(dir.path().join("ledger.db")));
    db.open().unwrap();
    db.upsert_client(&Record::new().with("id", json!("c1"))).unwrap();

    let bytes = db.backup(&backup).unwrap();
    assert!(bytes > 0);
    assert!(db.is_open(), "backup must reopen an open database");

    // When: A second client is added and the backup restored
    db.upsert_client(&Record::new().with("id", json!("c2"))).unwrap();
    db.restore(&backup).unwrap();

    // Then: The database is open again and holds only the first client
    assert!(db.is_open());
    let clients = db.list_clients().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].id(), Some("c1"));
}

#[test]
fn test_restore_into_closed_database_leaves_it_closed() {
    let dir = TempDir::new().unwrap();
    let backup = dir.path().join("backup.json");
    let mut db = Database::from_config(&StoreConfig::local_store(Some(
        dir.path().join("ledger.json"),
    )));
    db.open().unwrap();
    db.upsert_donor(&Record::new().with("id", json!("d1"))).unwrap();
    db.close().unwrap();

    db.backup(&backup).unwrap();
    db.restore(&backup).unwrap();

    assert!(!db.is_open());
    db.open().unwrap();
    assert!(db.get_donor_by_id("d1").unwrap().is_some());
}

#[test]
fn test_closed_database_fails_with_engine_closed() {
    let dir = TempDir::new().unwrap();
    for config in configs(&dir) {
        let mut db = Database::from_config(&config);

        let err = db
            .upsert_product(&Record::new().with("id", json!("p1")))
            .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::EngineClosed, "{}", config.backend);
        assert!(err.kind().is_precondition());
    }
}

#[test]
fn test_reset_reenables_writes() {
    let dir = TempDir::new().unwrap();
    for config in configs(&dir) {
        let mut db = Database::from_config(&config);
        db.open().unwrap();
        db.upsert_income(&Record::new().with("id", json!("in1"))).unwrap();

        db.reset().unwrap();

        assert!(db.list_income().unwrap().is_empty());
        db.upsert_income(&Record::new().with("id", json!("in2"))).unwrap();
        assert_eq!(db.list_income().unwrap().len(), 1, "{}", config.backend);
    }
}

#[test]
fn test_config_file_selects_backend() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let toml = format!(
        "[store]\nbackend = \"local-store\"\npath = {:?}\n",
        path.to_str().unwrap()
    );
    let config = LedgerConfig::from_toml_str(&toml).unwrap();

    let mut db = Database::from_config(&config.store);
    db.open().unwrap();
    db.upsert(Entity::Persons, &Record::new().with("id", json!("x1")))
        .unwrap();

    assert_eq!(db.backend(), BackendKind::LocalStore);
    assert!(path.is_file());
}
