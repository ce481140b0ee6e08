// Shared fixtures for store integration tests

use ledgerdesk_core::engine::PersistenceEngine;
use ledgerdesk_store::{LocalStoreEngine, SqliteEngine};
use std::path::Path;

/// One open engine per backend, both rooted in `dir`
pub fn open_backends(dir: &Path) -> Vec<Box<dyn PersistenceEngine>> {
    let mut engines: Vec<Box<dyn PersistenceEngine>> = vec![
        Box::new(SqliteEngine::new(dir.join("ledger.db"))),
        Box::new(LocalStoreEngine::with_snapshot(dir.join("ledger.json"))),
    ];
    for engine in engines.iter_mut() {
        engine.open().expect("Failed to open engine");
    }
    engines
}
