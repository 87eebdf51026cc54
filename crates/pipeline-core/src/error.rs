/// Transport-level pipeline failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The next stage (or the pipeline output) is gone.
    #[error("frame sink closed")]
    SinkClosed,
    /// A processor failed for a reason of its own.
    #[error("processor error: {0}")]
    Processor(String),
}
