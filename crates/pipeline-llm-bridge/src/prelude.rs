//! Common imports for wiring a bridge into a pipeline.
pub use crate::{
    AbortHandle, Backend, BackendError, BridgeOptions, Configurable, InputShape,
    InvocationOutcome, InvocationReport, LlmBridgeProcessor, ScriptEnd, ScriptedBackend,
    StreamElement, StreamingBridge,
};
