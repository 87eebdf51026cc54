//! Feeds one user turn through the LLM bridge stage and prints every output
//! frame as a JSON line.
//!
//! ```text
//! pipeline-demo --scenario graph --text "what is the answer?" --thread-id caller-1
//! pipeline-demo --script recorded.jsonl --text "hello"
//! ```

mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pipeline_core::observability::init_observability;
use pipeline_core::{
    ChannelSink, ChatMessage, ControlFrame, DirectedFrame, Frame, PipelineError, run_processor,
};
use pipeline_llm_bridge::{Backend, BridgeOptions, JsonLinesBackend, LlmBridgeProcessor, StreamingBridge};
use tokio::sync::mpsc;
use tracing::info;

use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "pipeline-demo", about = "Run one user turn through the LLM bridge stage")]
struct Cli {
    /// Replay backend output from a JSON-lines file instead of a built-in scenario.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Built-in backend script.
    #[arg(long, value_enum, default_value_t = Scenario::Simple)]
    scenario: Scenario,
    /// User message text.
    #[arg(long, default_value = "  Hello  ")]
    text: String,
    /// Conversation thread identity passed to the backend.
    #[arg(long)]
    thread_id: Option<String>,
}

/// Runs `text` through `processor` wrapped in start/stop control frames and
/// returns everything the stage emitted.
async fn run_turn(
    processor: &mut LlmBridgeProcessor,
    text: &str,
) -> Result<Vec<DirectedFrame>, PipelineError> {
    let (in_tx, in_rx) = mpsc::channel(8);
    let (sink, mut out_rx) = ChannelSink::channel(64);
    let collector = tokio::spawn(async move {
        let mut frames = Vec::new();
        while let Some(frame) = out_rx.recv().await {
            frames.push(frame);
        }
        frames
    });

    let inbound = [
        Frame::Control {
            signal: ControlFrame::Start,
        },
        Frame::messages(vec![ChatMessage::user(text)]),
        Frame::Control {
            signal: ControlFrame::Stop,
        },
    ];
    for frame in inbound {
        in_tx
            .send(DirectedFrame::downstream(frame))
            .await
            .map_err(|_| PipelineError::SinkClosed)?;
    }
    drop(in_tx);

    run_processor(processor, in_rx, &sink).await?;
    drop(sink);
    collector
        .await
        .map_err(|e| PipelineError::Processor(format!("output collector failed: {e}")))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_observability();
    let cli = Cli::parse();

    let backend: Arc<dyn Backend> = match &cli.script {
        Some(path) => Arc::new(JsonLinesBackend::new(path)),
        None => Arc::new(cli.scenario.backend()),
    };
    let options = BridgeOptions::from_env()?;
    info!(backend = backend.name(), input_shape = ?options.input_shape, "starting demo turn");

    let mut processor = LlmBridgeProcessor::new(StreamingBridge::with_options(backend, options)?);
    if let Some(thread_id) = cli.thread_id {
        processor.set_participant_id(thread_id);
    }

    for directed in run_turn(&mut processor, &cli.text).await? {
        println!("{}", serde_json::to_string(&directed.frame)?);
    }
    if let Some(report) = processor.last_report() {
        info!(outcome = ?report.outcome, text_chunks = report.text_chunks as u64, tool_results = report.tool_results as u64, "turn finished");
    }
    Ok(())
}
