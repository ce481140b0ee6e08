//! LedgerDesk Engine - the persistence facade handed to business logic
//!
//! Provides:
//! - `select_engine`: backend selection resolved once from configuration
//! - `Database`: one explicitly owned engine exposing the generic CRUD
//!   operations and the per-entity capability set, with boundary logging
//! - Backup/restore sequencing (close → copy → reopen)

mod accessors;
pub mod backend;
pub mod database;

pub use backend::{select_engine, select_engine_with_hook};
pub use database::Database;
