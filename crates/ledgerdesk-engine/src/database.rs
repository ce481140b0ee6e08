//! Database facade
//!
//! Owns one persistence engine and is the only layer that logs operation
//! boundaries. Every public operation follows the same pattern:
//!
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Errors leaving the facade carry the operation name and, when a
//! `RequestContext` is attached, its request/trace ids.

use crate::backend::select_engine;
use ledgerdesk_core::config::StoreConfig;
use ledgerdesk_core::engine::{BackendKind, PersistenceEngine};
use ledgerdesk_core::errors::{ExError, Result};
use ledgerdesk_core::model::{Entity, Record};
use ledgerdesk_core::{log_op_end, log_op_error, log_op_start};
use ledgerdesk_core_types::RequestContext;
use ledgerdesk_store::backup::{backup_engine, restore_engine};
use ledgerdesk_store::errors::no_storage_file;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// Table scope logged for operations spanning the whole store
const ALL_TABLES: &str = "*";

pub struct Database {
    engine: Box<dyn PersistenceEngine>,
    context: Option<RequestContext>,
}

impl Database {
    pub fn new(engine: Box<dyn PersistenceEngine>) -> Self {
        Self {
            engine,
            context: None,
        }
    }

    /// Database over the engine named by `config`, not yet opened
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(select_engine(config))
    }

    /// Attach a correlation context to every subsequent log line and error
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.engine.kind()
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.engine.storage_path()
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    // Lifecycle

    pub fn open(&mut self) -> Result<()> {
        let scope = self.scope("open", ALL_TABLES);
        scope.run(|| self.engine.open())
    }

    pub fn close(&mut self) -> Result<()> {
        let scope = self.scope("close", ALL_TABLES);
        scope.run(|| self.engine.close())
    }

    /// Wipe the persisted store and reopen it empty
    pub fn reset(&mut self) -> Result<()> {
        let scope = self.scope("reset", ALL_TABLES);
        scope.run(|| self.engine.reset())
    }

    pub fn ensure_database_exists(&self) -> Result<()> {
        self.scope("ensure_database_exists", ALL_TABLES)
            .run(|| self.engine.ensure_database_exists())
    }

    // Generic CRUD

    pub fn list(&self, entity: Entity) -> Result<Vec<Record>> {
        self.scope("list", entity.table_name())
            .run(|| self.engine.list(entity))
    }

    pub fn get_by_id(&self, entity: Entity, id: &str) -> Result<Option<Record>> {
        self.scope("get_by_id", entity.table_name())
            .run(|| self.engine.get_by_id(entity, id))
            .map_err(|e| e.with_record_id(id))
    }

    pub fn find_by(&self, entity: Entity, column: &str, value: &Value) -> Result<Vec<Record>> {
        self.scope("find_by", entity.table_name())
            .run(|| self.engine.find_by(entity, column, value))
    }

    pub fn upsert(&mut self, entity: Entity, record: &Record) -> Result<()> {
        let scope = self.scope("upsert", entity.table_name());
        scope.run(|| self.engine.upsert(entity, record))
    }

    pub fn delete(&mut self, entity: Entity, id: &str) -> Result<()> {
        let scope = self.scope("delete", entity.table_name());
        scope
            .run(|| self.engine.delete(entity, id))
            .map_err(|e| e.with_record_id(id))
    }

    pub fn update_fields(&mut self, entity: Entity, id: &str, patch: &Record) -> Result<()> {
        let scope = self.scope("update_fields", entity.table_name());
        scope
            .run(|| self.engine.update_fields(entity, id, patch))
            .map_err(|e| e.with_record_id(id))
    }

    pub fn clear(&mut self, entity: Entity) -> Result<()> {
        let scope = self.scope("clear", entity.table_name());
        scope.run(|| self.engine.clear(entity))
    }

    // Singletons and special lookups

    pub fn get_system_config(&self, id: &str) -> Result<Option<Record>> {
        self.get_by_id(Entity::SystemConfig, id)
    }

    pub fn put_system_config(&mut self, config: &Record) -> Result<()> {
        self.upsert(Entity::SystemConfig, config)
    }

    pub fn clear_system_config(&mut self) -> Result<()> {
        self.clear(Entity::SystemConfig)
    }

    /// The only entity callers patch field by field
    pub fn update_transaction_fields(&mut self, id: &str, patch: &Record) -> Result<()> {
        self.update_fields(Entity::Transactions, id, patch)
    }

    pub fn get_subscription_status(&self, id: &str) -> Result<Option<Record>> {
        self.get_by_id(Entity::SubscriptionStatus, id)
    }

    pub fn put_subscription_status(&mut self, status: &Record) -> Result<()> {
        self.upsert(Entity::SubscriptionStatus, status)
    }

    /// The invitation with the given code; codes are unique in practice,
    /// so the first match wins
    pub fn get_invitation_code_by_code(&self, code: &str) -> Result<Option<Record>> {
        let matches = self.find_by(Entity::InvitationCodes, "code", &Value::from(code))?;
        Ok(matches.into_iter().next())
    }

    // Backup and restore

    /// Copy the store file to `dest`
    ///
    /// The engine is closed for the copy and reopened afterwards if it was
    /// open. Returns the number of bytes copied.
    pub fn backup(&mut self, dest: &Path) -> Result<u64> {
        let scope = self.scope("backup", ALL_TABLES);
        let engine = &mut self.engine;
        scope.run(|| {
            with_engine_closed(engine.as_mut(), "backup", |e| backup_engine(e, dest))
        })
    }

    /// Replace the store file with the backup at `src`
    ///
    /// The engine is closed for the copy and reopened afterwards if it was
    /// open. Returns the number of bytes copied.
    pub fn restore(&mut self, src: &Path) -> Result<u64> {
        let scope = self.scope("restore", ALL_TABLES);
        let engine = &mut self.engine;
        scope.run(|| {
            with_engine_closed(engine.as_mut(), "restore", |e| restore_engine(e, src))
        })
    }

    fn scope(&self, op: &'static str, table: &'static str) -> OpScope {
        OpScope {
            op,
            table,
            backend: self.engine.kind(),
            context: self.context.clone(),
        }
    }
}

/// Run `copy` with the engine closed, restoring its open state afterwards
///
/// A reopen failure is always reported. When the copy itself succeeded the
/// error says how many bytes were already written; when both failed the
/// copy error is returned with the reopen error as its source.
fn with_engine_closed<F>(engine: &mut dyn PersistenceEngine, op: &str, copy: F) -> Result<u64>
where
    F: FnOnce(&dyn PersistenceEngine) -> Result<u64>,
{
    // Closing an in-memory engine would discard it
    if engine.storage_path().is_none() {
        return Err(no_storage_file(op));
    }

    let was_open = engine.is_open();
    engine.close()?;
    let copied = copy(&*engine);
    if !was_open {
        return copied;
    }

    match (copied, engine.open()) {
        (result, Ok(())) => result,
        (Ok(bytes), Err(open_err)) => Err(ExError::new(open_err.kind())
            .with_op(op)
            .with_message(format!(
                "{} copied {} bytes but the store could not be reopened",
                op, bytes
            ))
            .with_source(open_err)),
        (Err(copy_err), Err(open_err)) => Err(copy_err.with_source(open_err)),
    }
}

/// One logged operation boundary
struct OpScope {
    op: &'static str,
    table: &'static str,
    backend: BackendKind,
    context: Option<RequestContext>,
}

impl OpScope {
    fn run<T, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let request_id = self.context.as_ref().map(|c| c.request_id.as_str());
        log_op_start!(
            self.op,
            table = self.table,
            backend = %self.backend,
            request_id = request_id
        );
        let start = Instant::now();

        match f() {
            Ok(value) => {
                log_op_end!(
                    self.op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = self.table
                );
                Ok(value)
            }
            Err(err) => {
                let err = self.annotate(err);
                log_op_error!(
                    self.op,
                    &err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = self.table,
                    request_id = request_id
                );
                Err(err)
            }
        }
    }

    fn annotate(&self, err: ExError) -> ExError {
        let err = if err.op().is_none() {
            err.with_op(self.op)
        } else {
            err
        };
        match &self.context {
            Some(ctx) => err.with_context(ctx),
            None => err,
        }
    }
}
