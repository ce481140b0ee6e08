//! Structured logging facility for LedgerDesk
//!
//! - Single initialization point via `init(profile)`
//! - Operation boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The facade layer (`ledgerdesk-engine`) owns boundary logging. Backends
//! only emit `tracing::debug!` / `tracing::warn!` for internal detail.
//!
//! ```rust
//! use ledgerdesk_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
