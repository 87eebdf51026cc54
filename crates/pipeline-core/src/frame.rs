//! Frames are the units of traffic between pipeline stages.
//!
//! A full LLM response always travels as
//! `LlmFullResponseStart, <payload frames>, LlmFullResponseEnd`. When the
//! backend interleaves model tokens with other events, each token is
//! additionally wrapped in `LlmResponseStart` / `LlmResponseEnd`.

use serde::{Deserialize, Serialize};

/// Default `kind` carried by [`Frame::ToolResult`].
pub const TOOL_RESULT_KIND: &str = "tool_result";

/// One accumulated conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Out-of-band control signals. Stages that do not care about them forward them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFrame {
    Start,
    Stop,
    Interruption,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Messages ready for the LLM; produced by the upstream user-response aggregator.
    LlmMessages { messages: Vec<ChatMessage> },
    /// Beginning of one logical LLM response.
    LlmFullResponseStart,
    /// End of one logical LLM response. Paired with exactly one `LlmFullResponseStart`.
    LlmFullResponseEnd,
    /// Beginning of one individually framed token.
    LlmResponseStart,
    /// End of one individually framed token.
    LlmResponseEnd,
    Text { text: String },
    /// Structured side result, e.g. a retrieved document.
    ToolResult {
        result: serde_json::Value,
        kind: String,
    },
    Transcription {
        text: String,
        user_id: Option<String>,
    },
    Audio {
        audio: bytes::Bytes,
        sample_rate: u32,
        num_channels: u16,
    },
    Control { signal: ControlFrame },
}

impl Frame {
    pub fn text(text: impl Into<String>) -> Self {
        Frame::Text { text: text.into() }
    }

    pub fn tool_result(result: serde_json::Value) -> Self {
        Frame::ToolResult {
            result,
            kind: TOOL_RESULT_KIND.to_string(),
        }
    }

    pub fn messages(messages: Vec<ChatMessage>) -> Self {
        Frame::LlmMessages { messages }
    }

    /// Short stable name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::LlmMessages { .. } => "llm_messages",
            Frame::LlmFullResponseStart => "llm_full_response_start",
            Frame::LlmFullResponseEnd => "llm_full_response_end",
            Frame::LlmResponseStart => "llm_response_start",
            Frame::LlmResponseEnd => "llm_response_end",
            Frame::Text { .. } => "text",
            Frame::ToolResult { .. } => "tool_result",
            Frame::Transcription { .. } => "transcription",
            Frame::Audio { .. } => "audio",
            Frame::Control { .. } => "control",
        }
    }

    /// True for the response bracket markers (full or per-token).
    pub fn is_response_marker(&self) -> bool {
        matches!(
            self,
            Frame::LlmFullResponseStart
                | Frame::LlmFullResponseEnd
                | Frame::LlmResponseStart
                | Frame::LlmResponseEnd
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDirection {
    Downstream,
    Upstream,
}

/// A frame together with the direction it travels in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectedFrame {
    pub frame: Frame,
    pub direction: FrameDirection,
}

impl DirectedFrame {
    pub fn new(frame: Frame, direction: FrameDirection) -> Self {
        Self { frame, direction }
    }

    pub fn downstream(frame: Frame) -> Self {
        Self::new(frame, FrameDirection::Downstream)
    }

    pub fn upstream(frame: Frame) -> Self {
        Self::new(frame, FrameDirection::Upstream)
    }
}
