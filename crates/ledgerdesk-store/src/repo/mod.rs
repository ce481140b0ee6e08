//! Backend implementations of the persistence contract

pub mod local_store;
pub mod row;
pub mod sqlite_engine;

pub use local_store::LocalStoreEngine;
pub use sqlite_engine::SqliteEngine;
