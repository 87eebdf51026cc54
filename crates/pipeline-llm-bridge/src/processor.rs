use std::sync::Arc;

use pipeline_core::{Frame, FrameDirection, FrameProcessor, FrameSink, PipelineError};

use crate::backend::Backend;
use crate::bridge::{AbortHandle, InvocationOutcome, InvocationReport, StreamingBridge};
use crate::request::Configurable;

/// Pipeline stage in front of a [`StreamingBridge`].
///
/// `LlmMessages` frames trigger one invocation with the trimmed content of the
/// last message and are consumed. Every other frame is forwarded unchanged in
/// its original direction.
pub struct LlmBridgeProcessor {
    name: String,
    bridge: StreamingBridge,
    last_report: Option<InvocationReport>,
}

impl LlmBridgeProcessor {
    pub fn new(bridge: StreamingBridge) -> Self {
        Self {
            name: "llm_bridge".to_string(),
            bridge,
            last_report: None,
        }
    }

    /// Processor with default bridge options over `backend`.
    pub fn for_backend(backend: Arc<dyn Backend>) -> Self {
        Self::new(StreamingBridge::new(backend))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_configurable(&mut self, configurable: Configurable) {
        self.bridge.set_configurable(configurable);
    }

    pub fn set_participant_id(&mut self, participant_id: impl Into<String>) {
        self.bridge.set_participant_id(participant_id);
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.bridge.abort_handle()
    }

    pub fn bridge(&self) -> &StreamingBridge {
        &self.bridge
    }

    /// Report of the most recent invocation.
    pub fn last_report(&self) -> Option<&InvocationReport> {
        self.last_report.as_ref()
    }
}

#[async_trait::async_trait]
impl FrameProcessor for LlmBridgeProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_frame(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        sink: &dyn FrameSink,
    ) -> Result<(), PipelineError> {
        match frame {
            Frame::LlmMessages { messages } => {
                // The last entry is the most recent user turn from the aggregator.
                let text = messages
                    .last()
                    .map(|message| message.content.trim())
                    .unwrap_or_default();
                let report = self.bridge.invoke(text, sink).await;
                let sink_closed = report.outcome == InvocationOutcome::SinkClosed;
                self.last_report = Some(report);
                if sink_closed {
                    return Err(PipelineError::SinkClosed);
                }
                Ok(())
            }
            other => sink.push(other, direction).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{EventKind, StreamElement};
    use crate::errors::BackendError;
    use crate::scripted::{ScriptEnd, ScriptedBackend};
    use pipeline_core::{ChannelSink, ChatMessage, ControlFrame, DirectedFrame, run_processor};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn collect(rx: &mut mpsc::Receiver<DirectedFrame>) -> Vec<DirectedFrame> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(frame);
        }
        out
    }

    fn downstream(frames: Vec<Frame>) -> Vec<DirectedFrame> {
        frames.into_iter().map(DirectedFrame::downstream).collect()
    }

    #[tokio::test]
    async fn trigger_is_trimmed_and_consumed() {
        let backend = ScriptedBackend::from_texts("chain", ["Hel", "lo"]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        let (sink, mut rx) = ChannelSink::channel(16);

        processor
            .process_frame(
                Frame::messages(vec![ChatMessage::user("  Hello  ")]),
                FrameDirection::Downstream,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            collect(&mut rx),
            downstream(vec![
                Frame::LlmFullResponseStart,
                Frame::text("Hel"),
                Frame::text("lo"),
                Frame::LlmFullResponseEnd,
            ])
        );
        assert_eq!(backend.requests().await[0].text, "Hello");
        assert_eq!(processor.last_report().map(|r| r.text_chunks), Some(2));
    }

    #[tokio::test]
    async fn uses_last_message_of_the_list() {
        let backend = ScriptedBackend::new("chain", vec![]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        let (sink, _rx) = ChannelSink::channel(16);

        processor
            .process_frame(
                Frame::messages(vec![
                    ChatMessage::new("system", "be brief"),
                    ChatMessage::new("assistant", "hi"),
                    ChatMessage::user(" what now?\n"),
                ]),
                FrameDirection::Downstream,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(backend.requests().await[0].text, "what now?");
    }

    #[tokio::test]
    async fn empty_message_list_invokes_with_empty_text() {
        let backend = ScriptedBackend::new("chain", vec![]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        let (sink, mut rx) = ChannelSink::channel(16);

        processor
            .process_frame(Frame::messages(vec![]), FrameDirection::Downstream, &sink)
            .await
            .unwrap();

        assert_eq!(backend.requests().await[0].text, "");
        assert_eq!(
            collect(&mut rx),
            downstream(vec![Frame::LlmFullResponseStart, Frame::LlmFullResponseEnd])
        );
    }

    #[tokio::test]
    async fn backend_fault_does_not_surface() {
        let backend = ScriptedBackend::from_texts("chain", ["Hi"])
            .ending(ScriptEnd::Fail(BackendError::backend("chain", "boom")));
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend));
        let (sink, mut rx) = ChannelSink::channel(16);

        let result = processor
            .process_frame(
                Frame::messages(vec![ChatMessage::user("hey")]),
                FrameDirection::Downstream,
                &sink,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(
            collect(&mut rx),
            downstream(vec![
                Frame::LlmFullResponseStart,
                Frame::text("Hi"),
                Frame::LlmFullResponseEnd,
            ])
        );
    }

    #[tokio::test]
    async fn non_trigger_frames_pass_through_unchanged() {
        let backend = ScriptedBackend::from_texts("chain", ["unused"]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        let (sink, mut rx) = ChannelSink::channel(16);

        let inbound = vec![
            DirectedFrame::downstream(Frame::Audio {
                audio: bytes::Bytes::from_static(&[1, 2, 3]),
                sample_rate: 16_000,
                num_channels: 1,
            }),
            DirectedFrame::upstream(Frame::Control {
                signal: ControlFrame::Interruption,
            }),
            DirectedFrame::downstream(Frame::Transcription {
                text: "hello".into(),
                user_id: Some("u1".into()),
            }),
            DirectedFrame::upstream(Frame::text("from below")),
        ];
        for DirectedFrame { frame, direction } in inbound.clone() {
            processor.process_frame(frame, direction, &sink).await.unwrap();
        }

        assert_eq!(collect(&mut rx), inbound);
        assert!(backend.requests().await.is_empty());
    }

    #[tokio::test]
    async fn graph_backend_through_runner() {
        let backend = ScriptedBackend::new(
            "graph",
            vec![
                StreamElement::named(EventKind::ToolStart, json!({"input": {"q": "life"}})),
                StreamElement::named(EventKind::ModelStream, json!({"chunk": {"content": "42"}})),
                StreamElement::named(
                    EventKind::RetrieverEnd,
                    json!({"output": {"documents": [{"page_content": "D1"}, {"page_content": "D2"}]}}),
                ),
            ],
        );
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        processor.set_participant_id("abc");

        let (in_tx, in_rx) = mpsc::channel(8);
        let (sink, mut rx) = ChannelSink::channel(32);
        in_tx
            .send(DirectedFrame::downstream(Frame::Control {
                signal: ControlFrame::Start,
            }))
            .await
            .unwrap();
        in_tx
            .send(DirectedFrame::downstream(Frame::messages(vec![
                ChatMessage::user("meaning?"),
            ])))
            .await
            .unwrap();
        in_tx
            .send(DirectedFrame::downstream(Frame::Control {
                signal: ControlFrame::Stop,
            }))
            .await
            .unwrap();
        drop(in_tx);

        let handled = run_processor(&mut processor, in_rx, &sink).await.unwrap();

        assert_eq!(handled, 3);
        assert_eq!(
            collect(&mut rx),
            downstream(vec![
                Frame::Control {
                    signal: ControlFrame::Start
                },
                Frame::LlmFullResponseStart,
                Frame::LlmResponseStart,
                Frame::text("42"),
                Frame::LlmResponseEnd,
                Frame::tool_result(json!({"page_content": "D1"})),
                Frame::tool_result(json!({"page_content": "D2"})),
                Frame::LlmFullResponseEnd,
                Frame::Control {
                    signal: ControlFrame::Stop
                },
            ])
        );
        assert_eq!(
            backend.requests().await[0].option("thread_id"),
            Some(&json!("abc"))
        );
    }

    #[tokio::test]
    async fn configuration_update_reaches_backend() {
        let backend = ScriptedBackend::new("chain", vec![]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend.clone()));
        let (sink, _rx) = ChannelSink::channel(16);
        let mut configurable = Configurable::new();
        configurable.insert("thread_id".into(), json!("abc"));
        processor.set_configurable(configurable);

        processor
            .process_frame(
                Frame::messages(vec![ChatMessage::user("x")]),
                FrameDirection::Downstream,
                &sink,
            )
            .await
            .unwrap();

        let requests = backend.requests().await;
        assert_eq!(requests[0].option("thread_id"), Some(&json!("abc")));
        assert_eq!(requests[0].configurable.len(), 1);
    }

    #[tokio::test]
    async fn closed_sink_is_reported_to_the_pipeline() {
        let backend = ScriptedBackend::from_texts("chain", ["a"]);
        let mut processor = LlmBridgeProcessor::for_backend(Arc::new(backend));
        let (sink, rx) = ChannelSink::channel(4);
        drop(rx);

        let result = processor
            .process_frame(
                Frame::messages(vec![ChatMessage::user("x")]),
                FrameDirection::Downstream,
                &sink,
            )
            .await;

        assert_eq!(result, Err(PipelineError::SinkClosed));
    }
}
