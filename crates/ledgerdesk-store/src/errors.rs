//! Error helpers for ledgerdesk-store
//!
//! Wraps ledgerdesk-core ExError with store-specific constructors

use ledgerdesk_core::errors::{ExError, ExErrorKind};

pub use ledgerdesk_core::errors::Result;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a schema error; the database is unusable without its schema
pub fn schema_error(statement: &str, err: rusqlite::Error) -> ExError {
    let head = statement.lines().next().unwrap_or_default();
    ExError::new(ExErrorKind::Persistence)
        .with_op("ensure_schema")
        .with_message(format!("DDL failed ({}): {}", head.trim(), err))
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a local-store snapshot error
pub fn snapshot_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(format!("Invalid local-store snapshot: {}", err))
}

/// Backup/restore invoked while the engine still holds its handle
pub fn engine_open(operation: &str) -> ExError {
    ExError::new(ExErrorKind::EngineOpen)
        .with_op(operation.to_string())
        .with_message("engine must be closed before its storage file is copied")
}

/// The engine has no file to copy (in-memory store)
pub fn no_storage_file(operation: &str) -> ExError {
    ExError::new(ExErrorKind::CapabilityUnavailable)
        .with_op(operation.to_string())
        .with_message("engine is not backed by a file")
}
