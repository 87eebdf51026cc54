use tokio::sync::mpsc;

use crate::error::PipelineError;
use crate::frame::{DirectedFrame, Frame, FrameDirection};

/// Push-style link to the neighbouring stages.
///
/// `push` resolves once the frame has been accepted, so a bounded
/// implementation applies backpressure to the producer.
#[async_trait::async_trait]
pub trait FrameSink: Send + Sync {
    async fn push(&self, frame: Frame, direction: FrameDirection) -> Result<(), PipelineError>;
}

/// [`FrameSink`] over a bounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<DirectedFrame>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<DirectedFrame>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DirectedFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl FrameSink for ChannelSink {
    async fn push(&self, frame: Frame, direction: FrameDirection) -> Result<(), PipelineError> {
        self.tx
            .send(DirectedFrame::new(frame, direction))
            .await
            .map_err(|_| PipelineError::SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_preserves_direction() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.push(Frame::text("a"), FrameDirection::Upstream)
            .await
            .unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got, DirectedFrame::upstream(Frame::text("a")));
    }

    #[tokio::test]
    async fn push_fails_once_receiver_dropped() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let err = sink
            .push(Frame::LlmFullResponseEnd, FrameDirection::Downstream)
            .await;
        assert_eq!(err, Err(PipelineError::SinkClosed));
    }
}
