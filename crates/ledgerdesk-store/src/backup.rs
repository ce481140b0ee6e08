//! Backup and restore
//!
//! Both are verbatim copies of the engine's storage file. They require
//! exclusive access, so they refuse to run while the engine is open; the
//! caller sequences close → copy → open.

use crate::atomic::{atomic_write, remove_if_exists};
use crate::errors::{engine_open, io_error, no_storage_file, Result};
use crate::repo::sqlite_engine::database_files;
use ledgerdesk_core::engine::PersistenceEngine;
use ledgerdesk_core::errors::{ExError, ExErrorKind};
use std::fs;
use std::path::Path;

/// Copy `src` to `dest` byte for byte, returning the number of bytes
pub fn copy_database_file(src: &Path, dest: &Path, operation: &str) -> Result<u64> {
    if src == dest {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op(operation.to_string())
            .with_message("source and destination are the same file"));
    }
    let content = fs::read(src).map_err(|e| io_error(operation, e))?;
    atomic_write(dest, &content)?;
    Ok(content.len() as u64)
}

/// Copy the engine's storage file to `dest`
pub fn backup_engine(engine: &dyn PersistenceEngine, dest: &Path) -> Result<u64> {
    if engine.is_open() {
        return Err(engine_open("backup"));
    }
    let source = engine.storage_path().ok_or_else(|| no_storage_file("backup"))?;
    let bytes = copy_database_file(source, dest, "backup")?;

    tracing::debug!(source = %source.display(), dest = %dest.display(), bytes = bytes, "Backup written");
    Ok(bytes)
}

/// Overwrite the engine's storage file with the backup at `src`
///
/// Stale SQLite WAL/shared-memory files next to the target are removed
/// so they cannot be replayed over the restored database.
pub fn restore_engine(engine: &dyn PersistenceEngine, src: &Path) -> Result<u64> {
    if engine.is_open() {
        return Err(engine_open("restore"));
    }
    let target = engine.storage_path().ok_or_else(|| no_storage_file("restore"))?;
    if !src.is_file() {
        return Err(ExError::new(ExErrorKind::NotFound)
            .with_op("restore")
            .with_message(format!("backup file {} does not exist", src.display())));
    }

    let [_, wal, shm] = database_files(target);
    remove_if_exists(&wal, "restore")?;
    remove_if_exists(&shm, "restore")?;
    let bytes = copy_database_file(src, target, "restore")?;

    tracing::debug!(source = %src.display(), target = %target.display(), bytes = bytes, "Backup restored");
    Ok(bytes)
}
