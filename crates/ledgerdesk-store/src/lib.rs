//! LedgerDesk Store - storage backends for the persistence contract
//!
//! Provides:
//! - SQLite connection management and the schema manager
//! - `SqliteEngine`: the relational backend
//! - `LocalStoreEngine`: the key/value fallback backend
//! - Backup/restore as verbatim file copies taken while closed

pub mod atomic;
pub mod backup;
pub mod db;
pub mod errors;
pub mod repo;
pub mod schema;

pub use errors::Result;
pub use repo::{LocalStoreEngine, SqliteEngine};
