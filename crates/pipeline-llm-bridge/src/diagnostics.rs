//! Injected diagnostics for the bridge.
//!
//! The bridge reports what happened to a [`Diagnostics`] sink instead of
//! logging directly. [`TracingDiagnostics`] is the default and forwards to
//! `tracing`; [`MemoryDiagnostics`] keeps records for inspection.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::bridge::InvocationOutcome;
use crate::errors::{BackendError, CloseReason};

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    Invoking {
        invocation_id: Uuid,
        backend: String,
        text_len: usize,
    },
    ToolStarted {
        invocation_id: Uuid,
        name: Option<String>,
        input: Value,
    },
    ToolEnded {
        invocation_id: Uuid,
        name: Option<String>,
    },
    DocumentsRetrieved {
        invocation_id: Uuid,
        count: usize,
    },
    /// An element was skipped because its shape or payload was not usable.
    MalformedElement {
        invocation_id: Uuid,
        shape: &'static str,
        reason: &'static str,
    },
    StreamClosedPrematurely {
        invocation_id: Uuid,
        reason: CloseReason,
    },
    BackendFault {
        invocation_id: Uuid,
        error: BackendError,
    },
    SinkClosed {
        invocation_id: Uuid,
    },
    Finished {
        invocation_id: Uuid,
        outcome: InvocationOutcome,
        text_chunks: usize,
        tool_results: usize,
    },
}

pub trait Diagnostics: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Writes diagnostics as structured `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Invoking {
                invocation_id,
                backend,
                text_len,
            } => debug!(
                event = "bridge.invoking",
                domain = "bridge",
                invocation_id = %invocation_id,
                backend = backend.as_str(),
                text_len = text_len as u64
            ),
            Diagnostic::ToolStarted {
                invocation_id,
                name,
                input,
            } => debug!(
                event = "bridge.tool_started",
                domain = "bridge",
                invocation_id = %invocation_id,
                tool = name.as_deref().unwrap_or("<unnamed>"),
                input = %input
            ),
            Diagnostic::ToolEnded {
                invocation_id,
                name,
            } => debug!(
                event = "bridge.tool_ended",
                domain = "bridge",
                invocation_id = %invocation_id,
                tool = name.as_deref().unwrap_or("<unnamed>")
            ),
            Diagnostic::DocumentsRetrieved {
                invocation_id,
                count,
            } => debug!(
                event = "bridge.documents_retrieved",
                domain = "bridge",
                invocation_id = %invocation_id,
                count = count as u64
            ),
            Diagnostic::MalformedElement {
                invocation_id,
                shape,
                reason,
            } => debug!(
                event = "bridge.element_skipped",
                domain = "bridge",
                invocation_id = %invocation_id,
                shape,
                reason
            ),
            Diagnostic::StreamClosedPrematurely {
                invocation_id,
                reason,
            } => warn!(
                event = "bridge.stream_closed_prematurely",
                domain = "bridge",
                invocation_id = %invocation_id,
                reason = %reason
            ),
            Diagnostic::BackendFault {
                invocation_id,
                error,
            } => error!(
                event = "bridge.backend_fault",
                domain = "bridge",
                invocation_id = %invocation_id,
                backend = error.backend_name(),
                error = %error
            ),
            Diagnostic::SinkClosed { invocation_id } => warn!(
                event = "bridge.sink_closed",
                domain = "bridge",
                invocation_id = %invocation_id
            ),
            Diagnostic::Finished {
                invocation_id,
                outcome,
                text_chunks,
                tool_results,
            } => debug!(
                event = "bridge.finished",
                domain = "bridge",
                invocation_id = %invocation_id,
                outcome = ?outcome,
                text_chunks = text_chunks as u64,
                tool_results = tool_results as u64
            ),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryDiagnostics {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        match self.records.lock() {
            Ok(mut records) => records.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
