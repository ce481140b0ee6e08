//! Persistence engine contract
//!
//! One trait, implemented by every storage backend. All backends must be
//! observably equivalent: same codec, same partial-upsert semantics,
//! same absent/no-op rules.
//!
//! ## Lifecycle
//!
//! ```text
//! Closed --open()--> Open --close()--> Closed
//!   any  --reset()-> Open (store wiped, schema recreated)
//! ```
//!
//! CRUD operations on a closed engine fail with `EngineClosed`.

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{Entity, Record};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which backend implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Embedded SQLite database file
    #[default]
    Sqlite,
    /// Key/value local store (in memory, optionally snapshotted to a file)
    #[serde(alias = "local_store")]
    LocalStore,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => f.write_str("sqlite"),
            BackendKind::LocalStore => f.write_str("local-store"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sqlite" => Ok(BackendKind::Sqlite),
            "local-store" | "local_store" => Ok(BackendKind::LocalStore),
            other => Err(ExError::new(ExErrorKind::Config)
                .with_op("parse_backend")
                .with_message(format!("unknown backend '{}'", other))),
        }
    }
}

/// Uniform CRUD contract over the entity tables
pub trait PersistenceEngine: Send {
    fn kind(&self) -> BackendKind;

    /// File holding the persisted store, if any. Backup and restore copy
    /// this file verbatim while the engine is closed.
    fn storage_path(&self) -> Option<&Path>;

    fn is_open(&self) -> bool;

    /// Open the store and ensure the schema exists. Opening an open
    /// engine is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Release the handle. Closing a closed engine is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Close if open, delete the persisted store, and reopen empty
    fn reset(&mut self) -> Result<()>;

    /// Create the underlying storage location without opening a handle
    fn ensure_database_exists(&self) -> Result<()>;

    /// Every row of `entity`, decoded. Order is unspecified.
    fn list(&self, entity: Entity) -> Result<Vec<Record>>;

    /// The row with primary key `id`, or `None`
    fn get_by_id(&self, entity: Entity, id: &str) -> Result<Option<Record>>;

    /// Rows whose `column` equals `value`
    fn find_by(&self, entity: Entity, column: &str, value: &Value) -> Result<Vec<Record>>;

    /// Insert `record`, or overwrite the supplied columns of the existing
    /// row with the same `id`. Columns absent from `record` keep their
    /// stored value.
    fn upsert(&mut self, entity: Entity, record: &Record) -> Result<()>;

    /// Remove the row with primary key `id`; missing ids are a no-op
    fn delete(&mut self, entity: Entity, id: &str) -> Result<()>;

    /// Patch the columns present in `patch` on row `id`. An empty patch or
    /// a missing id is a no-op. An `id` key inside `patch` is ignored.
    fn update_fields(&mut self, entity: Entity, id: &str, patch: &Record) -> Result<()>;

    /// Remove every row of `entity`
    fn clear(&mut self, entity: Entity) -> Result<()>;
}

/// Validate the record's primary key for a write
pub fn require_id<'a>(op: &str, entity: Entity, record: &'a Record) -> Result<&'a str> {
    match record.id() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(crate::errors::missing_id(op, entity.table_name())),
    }
}

/// Validate that `column` is declared on `entity`
pub fn require_column(op: &str, entity: Entity, column: &str) -> Result<&'static str> {
    entity
        .descriptor()
        .column(column)
        .map(|c| c.name)
        .ok_or_else(|| crate::errors::unknown_column(op, entity.table_name(), column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_kind_parse_and_display() {
        assert_eq!("sqlite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!(
            "local-store".parse::<BackendKind>().unwrap(),
            BackendKind::LocalStore
        );
        assert_eq!(BackendKind::LocalStore.to_string(), "local-store");
        assert_eq!(
            "indexeddb".parse::<BackendKind>().unwrap_err().kind(),
            ExErrorKind::Config
        );
    }

    #[test]
    fn test_require_id() {
        let ok = Record::new().with("id", json!("p1"));
        assert_eq!(require_id("upsert", Entity::Products, &ok).unwrap(), "p1");

        let empty = Record::new().with("id", json!(""));
        assert!(require_id("upsert", Entity::Products, &empty).is_err());

        let missing = Record::new().with("name", json!("Widget"));
        let err = require_id("upsert", Entity::Products, &missing).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_require_column() {
        assert_eq!(
            require_column("find_by", Entity::InvitationCodes, "code").unwrap(),
            "code"
        );
        assert!(require_column("find_by", Entity::InvitationCodes, "drop table").is_err());
    }
}
