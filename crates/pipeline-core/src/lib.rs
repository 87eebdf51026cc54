//! Core pipeline types: frames, directions, push-style sinks and the
//! [`FrameProcessor`] stage trait.

pub mod error;
pub mod frame;
pub mod observability;
pub mod processor;
pub mod runtime;
pub mod sink;

pub use error::PipelineError;
pub use frame::{ChatMessage, ControlFrame, DirectedFrame, Frame, FrameDirection};
pub use processor::FrameProcessor;
pub use runtime::run_processor;
pub use sink::{ChannelSink, FrameSink};
