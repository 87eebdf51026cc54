use crate::error::PipelineError;
use crate::frame::{Frame, FrameDirection};
use crate::sink::FrameSink;

/// One pipeline stage.
///
/// `process_frame` takes `&mut self`: a stage handles one frame at a time and
/// the runner awaits each call before handing it the next frame.
#[async_trait::async_trait]
pub trait FrameProcessor: Send {
    /// Stage name used in logs.
    fn name(&self) -> &str;

    async fn process_frame(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        sink: &dyn FrameSink,
    ) -> Result<(), PipelineError>;
}
