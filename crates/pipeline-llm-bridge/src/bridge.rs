//! The streaming bridge: one backend call per [`StreamingBridge::invoke`],
//! republished as a framed sequence of pipeline frames.
//!
//! Every invocation emits `LlmFullResponseStart` first and
//! `LlmFullResponseEnd` last. Backend faults, cancellation and timeouts end
//! the response early but never skip the end marker and never reach the
//! caller as an error.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt as _;
use pipeline_core::{Frame, FrameDirection, FrameSink};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::backend::Backend;
use crate::classify::{Policy, classify};
use crate::diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics};
use crate::element::StreamElement;
use crate::errors::{BridgeError, CloseReason, StreamFault};
use crate::extract::token_text;
use crate::options::BridgeOptions;
use crate::request::{Configurable, InvocationRequest};

/// Configuration key set by [`StreamingBridge::set_participant_id`].
pub const THREAD_ID_KEY: &str = "thread_id";

/// Handle used to cancel the invocation currently in flight.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl AbortHandle {
    /// Requests cancellation of the running invocation.
    ///
    /// The invocation ends with `StreamClosedPrematurely(Cancelled)` and still
    /// emits its end marker. An abort issued while the bridge is idle does not
    /// affect later invocations.
    pub fn abort(&self) {
        self.tx.send_modify(|epoch| *epoch = epoch.wrapping_add(1));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The backend stream was drained to its end.
    Completed,
    /// A contained fault ended the stream early.
    EndedEarly(StreamFault),
    /// The downstream sink went away; the response may be incomplete downstream.
    SinkClosed,
}

/// What one invocation did. `invoke` always returns one of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub outcome: InvocationOutcome,
    pub text_chunks: usize,
    pub tool_results: usize,
}

pub struct StreamingBridge {
    backend: Arc<dyn Backend>,
    options: BridgeOptions,
    configurable: Configurable,
    diagnostics: Arc<dyn Diagnostics>,
    abort_tx: Arc<watch::Sender<u64>>,
    abort_rx: watch::Receiver<u64>,
}

impl StreamingBridge {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (abort_tx, abort_rx) = watch::channel(0_u64);
        Self {
            backend,
            options: BridgeOptions::default(),
            configurable: Configurable::new(),
            diagnostics: Arc::new(TracingDiagnostics),
            abort_tx: Arc::new(abort_tx),
            abort_rx,
        }
    }

    pub fn with_options(backend: Arc<dyn Backend>, options: BridgeOptions) -> Result<Self, BridgeError> {
        options.validate()?;
        let mut bridge = Self::new(backend);
        bridge.options = options;
        Ok(bridge)
    }

    /// Replaces the diagnostics sink (defaults to [`TracingDiagnostics`]).
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Merges `configurable` into the configuration mapping. New keys
    /// overwrite, keys not mentioned are kept.
    pub fn set_configurable(&mut self, configurable: Configurable) {
        self.configurable.extend(configurable);
    }

    /// Sets the conversation thread identity (`thread_id`).
    pub fn set_participant_id(&mut self, participant_id: impl Into<String>) {
        self.configurable
            .insert(THREAD_ID_KEY.to_string(), Value::String(participant_id.into()));
    }

    pub fn configurable(&self) -> &Configurable {
        &self.configurable
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: self.abort_tx.clone(),
        }
    }

    /// Runs one backend call and pushes its framed output to `sink`.
    ///
    /// Takes `&mut self`, so invocations on one bridge never overlap and the
    /// configuration mapping cannot change mid-invocation.
    pub async fn invoke(&mut self, text: &str, sink: &dyn FrameSink) -> InvocationReport {
        let request = InvocationRequest::new(
            text,
            self.configurable.clone(),
            self.options.input_shape.clone(),
        );
        // Aborts issued before this point belong to earlier invocations.
        let _ = self.abort_rx.borrow_and_update();

        let mut ctx = Invocation {
            id: request.invocation_id,
            sink,
            diagnostics: self.diagnostics.as_ref(),
            abort_rx: &mut self.abort_rx,
            text_chunks: 0,
            tool_results: 0,
        };
        ctx.record(Diagnostic::Invoking {
            invocation_id: ctx.id,
            backend: self.backend.name().to_string(),
            text_len: request.text.len(),
        });

        let started = ctx.emit(Frame::LlmFullResponseStart).await;
        let mut outcome = match started {
            Ok(()) => {
                drain(
                    self.backend.as_ref(),
                    request,
                    self.options.invocation_timeout,
                    &mut ctx,
                )
                .await
            }
            Err(interrupt) => interrupt.into_outcome(),
        };
        match &outcome {
            InvocationOutcome::Completed => {}
            InvocationOutcome::EndedEarly(StreamFault::ClosedPrematurely(reason)) => {
                ctx.record(Diagnostic::StreamClosedPrematurely {
                    invocation_id: ctx.id,
                    reason: *reason,
                });
            }
            InvocationOutcome::EndedEarly(StreamFault::Backend(error)) => {
                ctx.record(Diagnostic::BackendFault {
                    invocation_id: ctx.id,
                    error: error.clone(),
                });
            }
            InvocationOutcome::SinkClosed => {
                ctx.record(Diagnostic::SinkClosed { invocation_id: ctx.id });
            }
        }

        let torn_down = matches!(
            outcome,
            InvocationOutcome::SinkClosed
                | InvocationOutcome::EndedEarly(StreamFault::ClosedPrematurely(_))
        );
        let end_sent = push_end(
            sink,
            ctx.abort_rx,
            self.options.end_marker_timeout,
            torn_down,
        )
        .await;
        if !end_sent && outcome != InvocationOutcome::SinkClosed {
            ctx.record(Diagnostic::SinkClosed { invocation_id: ctx.id });
            outcome = InvocationOutcome::SinkClosed;
        }

        let report = InvocationReport {
            invocation_id: ctx.id,
            outcome,
            text_chunks: ctx.text_chunks,
            tool_results: ctx.tool_results,
        };
        ctx.record(Diagnostic::Finished {
            invocation_id: report.invocation_id,
            outcome: report.outcome.clone(),
            text_chunks: report.text_chunks,
            tool_results: report.tool_results,
        });
        report
    }
}

/// Why a push did not go through.
enum Interrupt {
    SinkClosed,
    Aborted,
}

impl Interrupt {
    fn into_outcome(self) -> InvocationOutcome {
        match self {
            Interrupt::SinkClosed => InvocationOutcome::SinkClosed,
            Interrupt::Aborted => {
                InvocationOutcome::EndedEarly(StreamFault::ClosedPrematurely(CloseReason::Cancelled))
            }
        }
    }
}

/// Per-invocation state.
struct Invocation<'a> {
    id: Uuid,
    sink: &'a dyn FrameSink,
    diagnostics: &'a dyn Diagnostics,
    abort_rx: &'a mut watch::Receiver<u64>,
    text_chunks: usize,
    tool_results: usize,
}

impl Invocation<'_> {
    fn record(&self, diagnostic: Diagnostic) {
        self.diagnostics.record(diagnostic);
    }

    /// Pushes one frame downstream, giving up if the invocation is aborted meanwhile.
    async fn emit(&mut self, frame: Frame) -> Result<(), Interrupt> {
        let counted = match &frame {
            Frame::Text { .. } => Some(true),
            Frame::ToolResult { .. } => Some(false),
            _ => None,
        };
        let pushed = tokio::select! {
            biased;
            Ok(()) = self.abort_rx.changed() => return Err(Interrupt::Aborted),
            pushed = self.sink.push(frame, FrameDirection::Downstream) => pushed,
        };
        if pushed.is_err() {
            return Err(Interrupt::SinkClosed);
        }
        match counted {
            Some(true) => self.text_chunks += 1,
            Some(false) => self.tool_results += 1,
            None => {}
        }
        Ok(())
    }

    /// Frames derived from one element, in emission order.
    fn frames_for(&self, element: StreamElement) -> Vec<Frame> {
        match element {
            StreamElement::PlainText(_) | StreamElement::MessageChunk(_) => {
                vec![Frame::text(token_text(&element))]
            }
            StreamElement::Unrecognized(_) => {
                self.record(Diagnostic::MalformedElement {
                    invocation_id: self.id,
                    shape: element.shape(),
                    reason: "unknown element shape",
                });
                Vec::new()
            }
            StreamElement::Named(event) => match classify(&event) {
                Policy::ModelToken(text) => vec![
                    Frame::LlmResponseStart,
                    Frame::text(text),
                    Frame::LlmResponseEnd,
                ],
                Policy::LogToolStart { name, input } => {
                    self.record(Diagnostic::ToolStarted {
                        invocation_id: self.id,
                        name,
                        input,
                    });
                    Vec::new()
                }
                Policy::ToolEnd { name } => {
                    self.record(Diagnostic::ToolEnded {
                        invocation_id: self.id,
                        name,
                    });
                    Vec::new()
                }
                Policy::Documents(docs) => {
                    self.record(Diagnostic::DocumentsRetrieved {
                        invocation_id: self.id,
                        count: docs.len(),
                    });
                    docs.into_iter().map(Frame::tool_result).collect()
                }
                Policy::Malformed { reason } => {
                    self.record(Diagnostic::MalformedElement {
                        invocation_id: self.id,
                        shape: "named_event",
                        reason,
                    });
                    Vec::new()
                }
                Policy::Ignore => Vec::new(),
            },
        }
    }
}

/// Opens the backend stream and drains it one element at a time.
async fn drain(
    backend: &dyn Backend,
    request: InvocationRequest,
    timeout: Option<Duration>,
    ctx: &mut Invocation<'_>,
) -> InvocationOutcome {
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let opened = tokio::select! {
        biased;
        Ok(()) = ctx.abort_rx.changed() => return closed(CloseReason::Cancelled),
        _ = &mut deadline => return closed(CloseReason::TimedOut),
        opened = backend.start_stream(request) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(err) => return InvocationOutcome::EndedEarly(StreamFault::Backend(err)),
    };

    loop {
        let next = tokio::select! {
            biased;
            Ok(()) = ctx.abort_rx.changed() => return closed(CloseReason::Cancelled),
            _ = &mut deadline => return closed(CloseReason::TimedOut),
            next = stream.next() => next,
        };
        let element = match next {
            None => return InvocationOutcome::Completed,
            Some(Err(err)) => return InvocationOutcome::EndedEarly(StreamFault::Backend(err)),
            Some(Ok(element)) => element,
        };
        for frame in ctx.frames_for(element) {
            if let Err(interrupt) = ctx.emit(frame).await {
                return interrupt.into_outcome();
            }
        }
    }
}

fn closed(reason: CloseReason) -> InvocationOutcome {
    InvocationOutcome::EndedEarly(StreamFault::ClosedPrematurely(reason))
}

/// Pushes the end marker. A torn-down invocation gets `limit` to deliver it;
/// otherwise the push waits on the sink until an abort arrives, then gets `limit`.
async fn push_end(
    sink: &dyn FrameSink,
    abort_rx: &mut watch::Receiver<u64>,
    limit: Duration,
    torn_down: bool,
) -> bool {
    let end = sink.push(Frame::LlmFullResponseEnd, FrameDirection::Downstream);
    tokio::pin!(end);
    if !torn_down {
        tokio::select! {
            biased;
            pushed = &mut end => return pushed.is_ok(),
            Ok(()) = abort_rx.changed() => {}
        }
    }
    matches!(tokio::time::timeout(limit, end).await, Ok(Ok(())))
}
