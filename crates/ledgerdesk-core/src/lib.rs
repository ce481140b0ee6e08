//! LedgerDesk Core - persistence contract and shared facilities
//!
//! This crate provides:
//! - The closed entity model (`Entity`, `EntityDescriptor`, `Record`)
//! - The record codec (JSON columns, boolean/integer coercion)
//! - The `PersistenceEngine` contract implemented by every backend
//! - The structured error and logging facilities
//! - Configuration loading

pub mod codec;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging_facility;
pub mod model;

// Used by the logging macros
#[doc(hidden)]
pub use ledgerdesk_core_types as core_types;
#[doc(hidden)]
pub use tracing;

pub use codec::{DecodeAnomaly, DecodeHook};
pub use config::{LedgerConfig, StoreConfig};
pub use engine::{BackendKind, PersistenceEngine};
pub use errors::{ExError, ExErrorKind, Result};
pub use model::{Entity, EntityDescriptor, Record};
