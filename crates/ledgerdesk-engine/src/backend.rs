//! Backend selection
//!
//! The host chooses a backend explicitly through configuration; nothing
//! here probes the environment.

use ledgerdesk_core::codec::DecodeHook;
use ledgerdesk_core::config::StoreConfig;
use ledgerdesk_core::engine::{BackendKind, PersistenceEngine};
use ledgerdesk_store::{LocalStoreEngine, SqliteEngine};

/// Construct the (closed) engine named by `config`
pub fn select_engine(config: &StoreConfig) -> Box<dyn PersistenceEngine> {
    select_engine_with_hook(config, None)
}

/// Like [`select_engine`], reporting JSON decode anomalies to `hook`
pub fn select_engine_with_hook(
    config: &StoreConfig,
    hook: Option<DecodeHook>,
) -> Box<dyn PersistenceEngine> {
    tracing::debug!(backend = %config.backend, path = ?config.path, "Selecting persistence engine");

    match (config.backend, hook) {
        (BackendKind::Sqlite, None) => Box::new(SqliteEngine::from_config(config)),
        (BackendKind::Sqlite, Some(hook)) => {
            Box::new(SqliteEngine::from_config(config).with_decode_hook(hook))
        }
        (BackendKind::LocalStore, None) => Box::new(LocalStoreEngine::from_config(config)),
        (BackendKind::LocalStore, Some(hook)) => {
            Box::new(LocalStoreEngine::from_config(config).with_decode_hook(hook))
        }
    }
}
