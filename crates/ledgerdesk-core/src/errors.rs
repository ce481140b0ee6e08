//! Error facility for LedgerDesk
//!
//! Every fallible persistence operation returns [`ExError`], a structured
//! error carrying a stable [`ExErrorKind`] plus optional context (operation,
//! table, record id, correlation ids). Callers branch on the kind; the
//! message is for humans.
//!
//! Absent records are not errors: lookups return `Ok(None)`, and deletes
//! or patches against a missing id succeed with zero effect.

use ledgerdesk_core_types::{RequestContext, RequestId, TraceId};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Canonical error kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Caller errors
    InvalidInput,
    NotFound,

    // Preconditions
    /// Operation invoked on a closed engine
    EngineClosed,
    /// Operation requires the engine to be closed (backup/restore)
    EngineOpen,
    /// The backend or host lacks a capability the operation relies on
    CapabilityUnavailable,

    // Storage faults
    Io,
    Serialization,
    Persistence,

    // Configuration
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::EngineClosed => "ERR_ENGINE_CLOSED",
            ExErrorKind::EngineOpen => "ERR_ENGINE_OPEN",
            ExErrorKind::CapabilityUnavailable => "ERR_CAPABILITY_UNAVAILABLE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for failures caused by the storage layer itself (I/O, SQL,
    /// constraint violations) as opposed to caller mistakes or lifecycle
    /// preconditions.
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            ExErrorKind::Io | ExErrorKind::Serialization | ExErrorKind::Persistence
        )
    }

    /// True for failures raised because the engine was in the wrong
    /// lifecycle state or lacks a capability.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExErrorKind::EngineClosed
                | ExErrorKind::EngineOpen
                | ExErrorKind::CapabilityUnavailable
        )
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    record_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            record_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add record id context
    pub fn with_record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach both correlation ids from a request context
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.request_id = Some(ctx.request_id.clone());
        self.trace_id = ctx.trace_id.clone();
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(record_id) = &self.record_id {
            write!(f, " (id: {})", record_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error for an operation attempted while the engine is closed
pub fn engine_closed(op: &str) -> ExError {
    ExError::new(ExErrorKind::EngineClosed)
        .with_op(op)
        .with_message("engine is closed; call open() first")
}

/// Error for a record that does not carry a usable string `id`
pub fn missing_id(op: &str, table: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(op)
        .with_table(table)
        .with_message("record must contain a non-empty string 'id'")
}

/// Error for a field that is not a declared column of the table
pub fn unknown_column(op: &str, table: &str, column: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(op)
        .with_table(table)
        .with_message(format!("unknown column '{}'", column))
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
