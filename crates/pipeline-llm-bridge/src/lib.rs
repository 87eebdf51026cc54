//! Pipeline stage that submits the latest user message to a generative
//! backend and republishes the streamed output as framed pipeline frames.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pipeline_core::{ChannelSink, ChatMessage, DirectedFrame, Frame, run_processor};
//! use pipeline_llm_bridge::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ScriptedBackend::from_texts("demo", ["Hel", "lo"]);
//! let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend));
//! processor.set_participant_id("caller-1");
//!
//! let (in_tx, in_rx) = tokio::sync::mpsc::channel(8);
//! let (sink, mut out_rx) = ChannelSink::channel(64);
//! in_tx
//!     .send(DirectedFrame::downstream(Frame::messages(vec![ChatMessage::user("Hello")])))
//!     .await?;
//! drop(in_tx);
//!
//! run_processor(&mut processor, in_rx, &sink).await?;
//! while let Ok(out) = out_rx.try_recv() {
//!     println!("{:?}", out.frame);
//! }
//! # Ok(())
//! # }
//! ```

/// Backend contract and element stream type.
pub mod backend;
/// Streaming bridge, abort handle and invocation reports.
pub mod bridge;
/// Named-event handling policies.
pub mod classify;
/// Injected diagnostics sink.
pub mod diagnostics;
/// Stream element model.
pub mod element;
/// Error types.
pub mod errors;
/// Token text normalization.
pub mod extract;
/// Backend replaying a JSON-lines recording.
pub mod jsonl;
/// Bridge options and environment loading.
pub mod options;
/// Common imports.
pub mod prelude;
/// Pipeline stage adapter.
pub mod processor;
/// Backend invocation request.
pub mod request;
/// Backend replaying a fixed script.
pub mod scripted;

pub use backend::{Backend, ElementStream};
pub use bridge::{AbortHandle, InvocationOutcome, InvocationReport, StreamingBridge};
pub use diagnostics::{Diagnostic, Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use element::{EventKind, MessageChunk, NamedEvent, StreamElement};
pub use errors::{BackendError, BridgeError, CloseReason, StreamFault};
pub use jsonl::JsonLinesBackend;
pub use options::BridgeOptions;
pub use processor::LlmBridgeProcessor;
pub use request::{Configurable, InputShape, InvocationRequest};
pub use scripted::{ScriptEnd, ScriptedBackend};
