//! SQLite backend
//!
//! Generic CRUD over the entity tables: every statement is built from the
//! entity descriptor, never from caller-supplied identifiers. Writes go
//! through the codec first, reads come back through it.

use crate::atomic::remove_if_exists;
use crate::db;
use crate::errors::{from_rusqlite, io_error, Result};
use crate::repo::row::{read_row, to_sql_value};
use crate::schema::{self, quote_ident};
use ledgerdesk_core::codec::{decode_for, encode_record, DecodeHook};
use ledgerdesk_core::config::{JournalMode, StoreConfig};
use ledgerdesk_core::engine::{require_column, require_id, BackendKind, PersistenceEngine};
use ledgerdesk_core::errors::engine_closed;
use ledgerdesk_core::model::{Entity, Record};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Params};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

enum Location {
    File(PathBuf),
    Memory,
}

/// Persistence engine backed by one SQLite connection
pub struct SqliteEngine {
    location: Location,
    journal_mode: JournalMode,
    busy_timeout: Duration,
    conn: Option<Connection>,
    decode_hook: Option<DecodeHook>,
}

impl SqliteEngine {
    /// Engine for the database file at `path` (created on open)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Engine for a private in-memory database; `reset` and `close` discard it
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let location = match &config.path {
            Some(path) => Location::File(path.clone()),
            None => Location::Memory,
        };
        Self {
            journal_mode: config.journal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            ..Self::with_location(location)
        }
    }

    fn with_location(location: Location) -> Self {
        let defaults = StoreConfig::default();
        Self {
            location,
            journal_mode: defaults.journal_mode,
            busy_timeout: Duration::from_millis(defaults.busy_timeout_ms),
            conn: None,
            decode_hook: None,
        }
    }

    /// Report JSON decode anomalies to `hook` in addition to the log
    pub fn with_decode_hook(mut self, hook: DecodeHook) -> Self {
        self.decode_hook = Some(hook);
        self
    }

    /// Borrow the open connection, for introspection and tests
    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    fn conn(&self, op: &str) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| engine_closed(op))
    }

    fn query_records<P: Params>(
        &self,
        op: &str,
        entity: Entity,
        sql: &str,
        params: P,
    ) -> Result<Vec<Record>> {
        let conn = self.conn(op)?;
        let table_err = |e| from_rusqlite(e).with_op(op).with_table(entity.table_name());

        let mut stmt = conn.prepare(sql).map_err(table_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(params, |row| read_row(row, &columns))
            .map_err(table_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(table_err)?;

        let descriptor = entity.descriptor();
        Ok(rows
            .into_iter()
            .map(|row| decode_for(descriptor, row, self.decode_hook.as_ref()))
            .collect())
    }

    fn execute<P: Params>(&self, op: &str, entity: Entity, sql: &str, params: P) -> Result<usize> {
        self.conn(op)?
            .execute(sql, params)
            .map_err(|e| from_rusqlite(e).with_op(op).with_table(entity.table_name()))
    }
}

/// The database file plus SQLite's WAL/shared-memory companions
pub(crate) fn database_files(path: &Path) -> [PathBuf; 3] {
    let with_suffix = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
}

impl PersistenceEngine for SqliteEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn storage_path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = match &self.location {
            Location::File(path) => {
                self.ensure_database_exists()?;
                db::open(path)?
            }
            Location::Memory => db::open_in_memory()?,
        };
        db::configure(&conn, self.journal_mode, self.busy_timeout)?;
        schema::ensure_schema(&conn)?;

        tracing::debug!(path = ?self.storage_path(), "SQLite engine opened");
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        if let Err((conn, e)) = conn.close() {
            self.conn = Some(conn);
            return Err(from_rusqlite(e).with_op("close"));
        }
        tracing::debug!(path = ?self.storage_path(), "SQLite engine closed");
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.close()?;
        if let Location::File(path) = &self.location {
            for file in database_files(path) {
                remove_if_exists(&file, "remove_database_file")?;
            }
        }
        self.open()
    }

    fn ensure_database_exists(&self) -> Result<()> {
        let Location::File(path) = &self.location else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_error("create_database_dir", e))?;
            }
        }
        // An empty file is a valid, empty SQLite database
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error("create_database_file", e))?;
        Ok(())
    }

    fn list(&self, entity: Entity) -> Result<Vec<Record>> {
        let sql = format!("SELECT * FROM {}", quote_ident(entity.table_name()));
        self.query_records("list", entity, &sql, [])
    }

    fn get_by_id(&self, entity: Entity, id: &str) -> Result<Option<Record>> {
        let conn = self.conn("get_by_id")?;
        let sql = format!("SELECT * FROM {} WHERE \"id\" = ?1", quote_ident(entity.table_name()));
        let table_err = |e| {
            from_rusqlite(e)
                .with_op("get_by_id")
                .with_table(entity.table_name())
                .with_record_id(id)
        };

        let mut stmt = conn.prepare(&sql).map_err(table_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let row = stmt
            .query_row([id], |row| read_row(row, &columns))
            .optional()
            .map_err(table_err)?;

        Ok(row.map(|r| decode_for(entity.descriptor(), r, self.decode_hook.as_ref())))
    }

    fn find_by(&self, entity: Entity, column: &str, value: &Value) -> Result<Vec<Record>> {
        let column = require_column("find_by", entity, column)?;
        let probe = Record::new().with(column, value.clone());
        let encoded = encode_record(entity.descriptor(), &probe, "find_by")?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} IS ?1",
            quote_ident(entity.table_name()),
            quote_ident(column)
        );
        let params = encoded.iter().map(|(_, v)| to_sql_value(v));
        self.query_records("find_by", entity, &sql, params_from_iter(params))
    }

    fn upsert(&mut self, entity: Entity, record: &Record) -> Result<()> {
        let id = require_id("upsert", entity, record)?;
        let encoded = encode_record(entity.descriptor(), record, "upsert")?;

        let columns: Vec<String> = encoded.iter().map(|(c, _)| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=encoded.len()).map(|i| format!("?{}", i)).collect();
        let updates: Vec<String> = encoded
            .iter()
            .filter(|(c, _)| *c != "id")
            .map(|(c, _)| format!("{0} = excluded.{0}", quote_ident(c)))
            .collect();
        let conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(\"id\") {}",
            quote_ident(entity.table_name()),
            columns.join(", "),
            placeholders.join(", "),
            conflict
        );

        let params = encoded.iter().map(|(_, v)| to_sql_value(v));
        self.execute("upsert", entity, &sql, params_from_iter(params))
            .map_err(|e| e.with_record_id(id))?;

        tracing::debug!(table = entity.table_name(), id = id, columns = encoded.len(), "Upserted row");
        Ok(())
    }

    fn delete(&mut self, entity: Entity, id: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE \"id\" = ?1", quote_ident(entity.table_name()));
        let affected = self
            .execute("delete", entity, &sql, [id])
            .map_err(|e| e.with_record_id(id))?;

        tracing::debug!(table = entity.table_name(), id = id, affected = affected, "Deleted row");
        Ok(())
    }

    fn update_fields(&mut self, entity: Entity, id: &str, patch: &Record) -> Result<()> {
        let patch: Record = patch
            .iter()
            .filter(|(k, _)| k.as_str() != "id")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if patch.is_empty() {
            // Still surface a closed engine
            self.conn("update_fields")?;
            return Ok(());
        }

        let encoded = encode_record(entity.descriptor(), &patch, "update_fields")?;
        let assignments: Vec<String> = encoded
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("{} = ?{}", quote_ident(c), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE \"id\" = ?{}",
            quote_ident(entity.table_name()),
            assignments.join(", "),
            encoded.len() + 1
        );

        let params = encoded
            .iter()
            .map(|(_, v)| to_sql_value(v))
            .chain(std::iter::once(rusqlite::types::Value::Text(id.to_string())));
        let affected = self
            .execute("update_fields", entity, &sql, params_from_iter(params))
            .map_err(|e| e.with_record_id(id))?;

        tracing::debug!(table = entity.table_name(), id = id, affected = affected, "Patched row");
        Ok(())
    }

    fn clear(&mut self, entity: Entity) -> Result<()> {
        let sql = format!("DELETE FROM {}", quote_ident(entity.table_name()));
        self.execute("clear", entity, &sql, [])?;
        Ok(())
    }
}
