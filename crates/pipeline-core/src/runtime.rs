use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::frame::DirectedFrame;
use crate::processor::FrameProcessor;
use crate::sink::FrameSink;

/// Drives `processor` with frames from `inbound` until the channel closes.
///
/// Frames are handled strictly one after another. Returns the first error the
/// processor reports; the remaining inbound frames are left unread.
pub async fn run_processor<P>(
    processor: &mut P,
    mut inbound: mpsc::Receiver<DirectedFrame>,
    outbound: &dyn FrameSink,
) -> Result<u64, PipelineError>
where
    P: FrameProcessor + ?Sized,
{
    let mut handled = 0_u64;
    while let Some(DirectedFrame { frame, direction }) = inbound.recv().await {
        debug!(
            event = "pipeline.frame_received",
            domain = "pipeline",
            processor = processor.name(),
            frame = frame.kind(),
            direction = ?direction,
            seq = handled
        );
        if let Err(err) = processor.process_frame(frame, direction, outbound).await {
            warn!(
                event = "pipeline.processor_failed",
                domain = "pipeline",
                processor = processor.name(),
                error = %err
            );
            return Err(err);
        }
        handled = handled.saturating_add(1);
    }
    debug!(
        event = "pipeline.inbound_closed",
        domain = "pipeline",
        processor = processor.name(),
        handled
    );
    Ok(handled)
}
