//! Local-store backend
//!
//! Keeps encoded rows per table in memory, the way a browser key/value
//! store would, and optionally snapshots them to a JSON file after every
//! mutation. Rows go through the same codec as the SQLite backend, so a
//! caller cannot tell the two apart: booleans are stored as 0/1,
//! structured values as JSON text, and declared columns never written
//! read back as null.
//!
//! Without a snapshot path the store is ephemeral: `close` discards it.

use crate::atomic::{atomic_write, remove_if_exists};
use crate::errors::{io_error, snapshot_error, Result};
use ledgerdesk_core::codec::{decode_for, encode_record, DecodeHook};
use ledgerdesk_core::config::StoreConfig;
use ledgerdesk_core::engine::{require_column, require_id, BackendKind, PersistenceEngine};
use ledgerdesk_core::errors::{engine_closed, ExError, ExErrorKind};
use ledgerdesk_core::model::{Entity, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

type Tables = BTreeMap<Entity, BTreeMap<String, Record>>;

/// On-disk snapshot layout
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: String,
    tables: BTreeMap<String, Vec<Record>>,
}

pub struct LocalStoreEngine {
    snapshot_path: Option<PathBuf>,
    tables: Option<Tables>,
    decode_hook: Option<DecodeHook>,
}

impl LocalStoreEngine {
    /// In-memory store that does not outlive `close`
    pub fn ephemeral() -> Self {
        Self {
            snapshot_path: None,
            tables: None,
            decode_hook: None,
        }
    }

    /// Store snapshotted to `path`
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
            ..Self::ephemeral()
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        match &config.path {
            Some(path) => Self::with_snapshot(path.clone()),
            None => Self::ephemeral(),
        }
    }

    pub fn with_decode_hook(mut self, hook: DecodeHook) -> Self {
        self.decode_hook = Some(hook);
        self
    }

    fn tables(&self, op: &str) -> Result<&Tables> {
        self.tables.as_ref().ok_or_else(|| engine_closed(op))
    }

    fn tables_mut(&mut self, op: &str) -> Result<&mut Tables> {
        self.tables.as_mut().ok_or_else(|| engine_closed(op))
    }

    /// Decode a stored row, filling in declared columns never written
    fn read(&self, entity: Entity, stored: &Record) -> Record {
        let mut row = empty_row(entity);
        row.merge(stored);
        decode_for(entity.descriptor(), row, self.decode_hook.as_ref())
    }

    fn persist(&self) -> Result<()> {
        let (Some(path), Some(tables)) = (&self.snapshot_path, &self.tables) else {
            return Ok(());
        };
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            tables: tables
                .iter()
                .map(|(entity, rows)| {
                    let rows: Vec<Record> = rows.values().cloned().collect();
                    (entity.table_name().to_string(), rows)
                })
                .collect(),
        };
        let bytes =
            serde_json::to_vec(&snapshot).map_err(|e| snapshot_error("persist_snapshot", e))?;
        atomic_write(path, &bytes)
    }
}

fn empty_tables() -> Tables {
    Entity::ALL.iter().map(|e| (*e, BTreeMap::new())).collect()
}

fn empty_row(entity: Entity) -> Record {
    entity
        .descriptor()
        .column_names()
        .map(|c| (c.to_string(), Value::Null))
        .collect()
}

fn load_snapshot(path: &Path) -> Result<Tables> {
    let mut tables = empty_tables();
    if !path.exists() {
        return Ok(tables);
    }

    let content = std::fs::read_to_string(path).map_err(|e| io_error("read_snapshot", e))?;
    if content.trim().is_empty() {
        return Ok(tables);
    }

    let snapshot: Snapshot =
        serde_json::from_str(&content).map_err(|e| snapshot_error("load_snapshot", e))?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(ExError::new(ExErrorKind::Serialization)
            .with_op("load_snapshot")
            .with_message(format!("unsupported snapshot version {}", snapshot.version)));
    }

    for (name, rows) in snapshot.tables {
        let Ok(entity) = name.parse::<Entity>() else {
            tracing::warn!(table = %name, "Skipping unknown table in local-store snapshot");
            continue;
        };
        let table = tables.entry(entity).or_default();
        for row in rows {
            match row.id() {
                Some(id) => {
                    // Snapshots written by hand or by older builds may omit columns
                    let mut filled = empty_row(entity);
                    filled.merge(&row);
                    table.insert(id.to_string(), filled);
                }
                None => tracing::warn!(table = %name, "Skipping snapshot row without id"),
            }
        }
    }

    Ok(tables)
}

/// Equality as SQLite compares values: numbers by numeric value
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

impl PersistenceEngine for LocalStoreEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalStore
    }

    fn storage_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    fn is_open(&self) -> bool {
        self.tables.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.tables.is_some() {
            return Ok(());
        }
        let tables = match &self.snapshot_path {
            Some(path) => load_snapshot(path)?,
            None => empty_tables(),
        };
        tracing::debug!(path = ?self.snapshot_path, "Local store opened");
        self.tables = Some(tables);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.tables = None;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.tables = None;
        if let Some(path) = &self.snapshot_path {
            remove_if_exists(path, "remove_snapshot")?;
        }
        self.open()
    }

    fn ensure_database_exists(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if path.exists() {
            return Ok(());
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            tables: BTreeMap::new(),
        };
        let bytes =
            serde_json::to_vec(&snapshot).map_err(|e| snapshot_error("create_snapshot", e))?;
        atomic_write(path, &bytes)
    }

    fn list(&self, entity: Entity) -> Result<Vec<Record>> {
        let tables = self.tables("list")?;
        Ok(tables
            .get(&entity)
            .map(|rows| rows.values().map(|r| self.read(entity, r)).collect())
            .unwrap_or_default())
    }

    fn get_by_id(&self, entity: Entity, id: &str) -> Result<Option<Record>> {
        let tables = self.tables("get_by_id")?;
        Ok(tables
            .get(&entity)
            .and_then(|rows| rows.get(id))
            .map(|r| self.read(entity, r)))
    }

    fn find_by(&self, entity: Entity, column: &str, value: &Value) -> Result<Vec<Record>> {
        let column = require_column("find_by", entity, column)?;
        let probe = Record::new().with(column, value.clone());
        let encoded = encode_record(entity.descriptor(), &probe, "find_by")?;
        let Some((_, wanted)) = encoded.into_iter().next() else {
            return Ok(Vec::new());
        };

        let tables = self.tables("find_by")?;
        Ok(tables
            .get(&entity)
            .map(|rows| {
                rows.values()
                    .filter(|r| values_equal(r.get(column).unwrap_or(&Value::Null), &wanted))
                    .map(|r| self.read(entity, r))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn upsert(&mut self, entity: Entity, record: &Record) -> Result<()> {
        let id = require_id("upsert", entity, record)?.to_string();
        let encoded = encode_record(entity.descriptor(), record, "upsert")?;

        let row = self
            .tables_mut("upsert")?
            .entry(entity)
            .or_default()
            .entry(id)
            .or_insert_with(|| empty_row(entity));
        for (column, value) in encoded {
            row.insert(column, value);
        }

        self.persist()
    }

    fn delete(&mut self, entity: Entity, id: &str) -> Result<()> {
        let removed = self
            .tables_mut("delete")?
            .get_mut(&entity)
            .and_then(|rows| rows.remove(id))
            .is_some();
        if removed {
            self.persist()?;
        }
        Ok(())
    }

    fn update_fields(&mut self, entity: Entity, id: &str, patch: &Record) -> Result<()> {
        let patch: Record = patch
            .iter()
            .filter(|(k, _)| k.as_str() != "id")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if patch.is_empty() {
            self.tables("update_fields")?;
            return Ok(());
        }

        let encoded = encode_record(entity.descriptor(), &patch, "update_fields")?;
        let Some(row) = self
            .tables_mut("update_fields")?
            .get_mut(&entity)
            .and_then(|rows| rows.get_mut(id))
        else {
            return Ok(());
        };
        for (column, value) in encoded {
            row.insert(column, value);
        }

        self.persist()
    }

    fn clear(&mut self, entity: Entity) -> Result<()> {
        self.tables_mut("clear")?.entry(entity).or_default().clear();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_are_stored_encoded() {
        let mut engine = LocalStoreEngine::ephemeral();
        engine.open().unwrap();
        engine
            .upsert(
                Entity::Clients,
                &Record::new()
                    .with("id", json!("c1"))
                    .with("whatsapp", json!(true))
                    .with("tags", json!(["vip"])),
            )
            .unwrap();

        let stored = &engine.tables.as_ref().unwrap()[&Entity::Clients]["c1"];
        assert_eq!(stored.get("whatsapp"), Some(&json!(1)));
        assert_eq!(stored.get("tags"), Some(&json!("[\"vip\"]")));
    }

    #[test]
    fn test_unwritten_columns_read_as_null() {
        let mut engine = LocalStoreEngine::ephemeral();
        engine.open().unwrap();
        engine
            .upsert(Entity::Sales, &Record::new().with("id", json!("s1")))
            .unwrap();

        let sale = engine.get_by_id(Entity::Sales, "s1").unwrap().unwrap();
        assert_eq!(sale.len(), Entity::Sales.descriptor().columns.len());
        assert_eq!(sale.get("total"), Some(&json!(null)));
    }

    #[test]
    fn test_ephemeral_store_is_discarded_on_close() {
        let mut engine = LocalStoreEngine::ephemeral();
        engine.open().unwrap();
        engine
            .upsert(Entity::Products, &Record::new().with("id", json!("p1")))
            .unwrap();
        engine.close().unwrap();
        engine.open().unwrap();

        assert!(engine.list(Entity::Products).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_snapshot_table_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"version":1,"saved_at":"x","tables":{"legacy":[{"id":"a"}],"products":[{"id":"p1","name":"Widget"}]}}"#,
        )
        .unwrap();

        let mut engine = LocalStoreEngine::with_snapshot(&path);
        engine.open().unwrap();

        let products = engine.list(Entity::Products).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].get("name"), Some(&json!("Widget")));
    }

    #[test]
    fn test_snapshot_rows_missing_columns_match_null() {
        // Given a snapshot row that omits most product columns
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"version":1,"saved_at":"x","tables":{"products":[{"id":"p1"}]}}"#,
        )
        .unwrap();

        let mut engine = LocalStoreEngine::with_snapshot(&path);
        engine.open().unwrap();

        // When searching for rows with no name
        let rows = engine.find_by(Entity::Products, "name", &json!(null)).unwrap();

        // Then the partial row is found, with every column present
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!(null)));
        assert!(rows[0].contains_key("stock"));
    }

    #[test]
    fn test_future_snapshot_version_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version":99,"saved_at":"x","tables":{}}"#).unwrap();

        let mut engine = LocalStoreEngine::with_snapshot(&path);
        let err = engine.open().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
        assert!(!engine.is_open());
    }

    #[test]
    fn test_values_equal_compares_numbers_numerically() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }
}
