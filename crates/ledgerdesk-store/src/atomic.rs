//! Atomic write primitives
//!
//! Uses temp→rename so a reader never observes a partially written file

use crate::errors::{io_error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_parent_dir", e))?;
        }
    }

    let temp_path = temp_path_for(target_path);

    fs::write(&temp_path, content).map_err(|e| io_error("write_temp", e))?;

    fs::rename(&temp_path, target_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_error("rename_temp", e)
    })?;

    Ok(())
}

/// Remove a file, treating "already gone" as success
pub fn remove_if_exists(path: &Path, operation: &str) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(operation, e)),
    }
}

/// Sibling temp path: `ledger.db` → `ledger.db.tmp`
fn temp_path_for(target_path: &Path) -> PathBuf {
    let mut name = target_path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("test.db");

        atomic_write(&target, b"hello").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("backups").join("test.db");

        atomic_write(&target, b"nested").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"nested");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("test.db");

        atomic_write(&target, b"old").unwrap();
        atomic_write(&target, b"new").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_remove_if_exists_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("gone.db");

        assert!(remove_if_exists(&target, "remove").is_ok());
        atomic_write(&target, b"x").unwrap();
        remove_if_exists(&target, "remove").unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_no_tmp_files_after_write() {
        let temp_dir = TempDir::new().unwrap();
        atomic_write(&temp_dir.path().join("test.db"), b"clean").unwrap();

        let tmp_count = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();

        assert_eq!(tmp_count, 0);
    }
}
