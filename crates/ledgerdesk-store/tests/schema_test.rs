// Integration tests for the schema manager

use ledgerdesk_core::engine::PersistenceEngine;
use ledgerdesk_core::model::{Entity, Record};
use ledgerdesk_store::schema::{ensure_schema, index_names, table_names};
use ledgerdesk_store::SqliteEngine;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_open_creates_every_table_and_index() {
    let dir = TempDir::new().unwrap();
    let mut engine = SqliteEngine::new(dir.path().join("ledger.db"));
    engine.open().unwrap();

    let conn = engine.connection().unwrap();
    let tables = table_names(conn).unwrap();
    for entity in Entity::ALL {
        assert!(tables.contains(&entity.table_name().to_string()), "{}", entity);
    }

    let indexes = index_names(conn).unwrap();
    for entity in Entity::ALL {
        for index in entity.descriptor().indexes {
            assert!(indexes.contains(&index.name().to_string()), "{}", index.name());
        }
    }
}

#[test]
fn test_ensure_schema_twice_keeps_rows() {
    // Given: A database holding a row
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let mut engine = SqliteEngine::new(&path);
    engine.open().unwrap();
    engine
        .upsert(Entity::Products, &Record::new().with("id", json!("p1")))
        .unwrap();

    // When: The schema is ensured again directly
    ensure_schema(engine.connection().unwrap()).unwrap();

    // Then: Nothing was dropped
    assert_eq!(engine.list(Entity::Products).unwrap().len(), 1);
}

#[test]
fn test_reopen_preserves_existing_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let mut engine = SqliteEngine::new(&path);
        engine.open().unwrap();
        engine
            .upsert(
                Entity::Income,
                &Record::new().with("id", json!("in1")).with("value", json!(42.5)),
            )
            .unwrap();
        engine.close().unwrap();
    }

    let mut engine = SqliteEngine::new(&path);
    engine.open().unwrap();
    let row = engine.get_by_id(Entity::Income, "in1").unwrap().unwrap();
    assert_eq!(row.get("value"), Some(&json!(42.5)));
}

#[test]
fn test_ensure_database_exists_creates_file_and_parents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("ledger.db");
    let engine = SqliteEngine::new(&path);

    engine.ensure_database_exists().unwrap();

    assert!(path.is_file());
    assert!(!engine.is_open());
}

#[test]
fn test_year_index_is_used_for_year_filters() {
    let dir = TempDir::new().unwrap();
    let mut engine = SqliteEngine::new(dir.path().join("ledger.db"));
    engine.open().unwrap();

    let plan: Vec<String> = {
        let conn = engine.connection().unwrap();
        let mut stmt = conn
            .prepare(
                "EXPLAIN QUERY PLAN SELECT * FROM \"transactions\" \
                 WHERE substr(\"date\", 1, 4) = '2024'",
            )
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    };

    assert!(
        plan.iter().any(|line| line.contains("idx_transactions_year")),
        "plan: {:?}",
        plan
    );
}
