//! Configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file
//! (or no file) yields a usable in-memory configuration.
//!
//! ```toml
//! [store]
//! backend = "sqlite"
//! path = "data/ledgerdesk.db"
//! journal_mode = "wal"
//!
//! [logging]
//! profile = "production"
//! ```

use crate::engine::BackendKind;
use crate::errors::{ExError, ExErrorKind};
use crate::logging_facility::Profile;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `store.path`
pub const ENV_DB_PATH: &str = "LEDGERDESK_DB";
/// Environment variable overriding `store.backend`
pub const ENV_BACKEND: &str = "LEDGERDESK_BACKEND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Override { key: &'static str, message: String },
}

impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        ExError::new(ExErrorKind::Config)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Database file (SQLite) or snapshot file (local store). `None`
    /// keeps everything in memory.
    pub path: Option<PathBuf>,
    pub journal_mode: JournalMode,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            path: None,
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// SQLite configuration for a database file
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Local-store configuration, optionally snapshotted to `path`
    pub fn local_store(path: Option<PathBuf>) -> Self {
        Self {
            backend: BackendKind::LocalStore,
            path,
            ..Self::default()
        }
    }
}

/// SQLite journal mode applied on open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    Delete,
    #[default]
    Wal,
    Memory,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `LEDGERDESK_DB` / `LEDGERDESK_BACKEND` from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(backend) = lookup(ENV_BACKEND).filter(|b| !b.is_empty()) {
            self.store.backend = backend.parse().map_err(|e: ExError| ConfigError::Override {
                key: ENV_BACKEND,
                message: e.message().to_string(),
            })?;
        }
        Ok(())
    }
}
