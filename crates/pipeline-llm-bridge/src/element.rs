//! Items yielded by a backend's output stream.
//!
//! Text-streaming backends yield [`StreamElement::PlainText`] or
//! [`StreamElement::MessageChunk`]; event-graph backends yield
//! [`StreamElement::Named`]. Anything else is kept as
//! [`StreamElement::Unrecognized`] so the bridge can skip it explicitly.

use serde_json::Value;

/// Incremental piece of an assistant message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageChunk {
    pub content: String,
}

impl MessageChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Declared kind of a named graph event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    ModelStream,
    ToolStart,
    ToolEnd,
    RetrieverEnd,
    Other(String),
}

impl EventKind {
    /// Maps a wire event name (`on_chat_model_stream`, `tool_start`, ...) to a kind.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "on_chat_model_stream" | "model_stream" => EventKind::ModelStream,
            "on_tool_start" | "tool_start" => EventKind::ToolStart,
            "on_tool_end" | "tool_end" => EventKind::ToolEnd,
            "on_retriever_end" | "retriever_end" => EventKind::RetrieverEnd,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ModelStream => "model_stream",
            EventKind::ToolStart => "tool_start",
            EventKind::ToolEnd => "tool_end",
            EventKind::RetrieverEnd => "retriever_end",
            EventKind::Other(name) => name,
        }
    }
}

/// Event from a full event-graph backend.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedEvent {
    pub kind: EventKind,
    /// Name of the component that produced the event (tool name, retriever name).
    pub name: Option<String>,
    /// Opaque event payload.
    pub data: Value,
}

impl NamedEvent {
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            name: None,
            data,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StreamElement {
    PlainText(String),
    MessageChunk(MessageChunk),
    Named(NamedEvent),
    Unrecognized(Value),
}

impl StreamElement {
    pub fn text(text: impl Into<String>) -> Self {
        StreamElement::PlainText(text.into())
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        StreamElement::MessageChunk(MessageChunk::new(content))
    }

    pub fn named(kind: EventKind, data: Value) -> Self {
        StreamElement::Named(NamedEvent::new(kind, data))
    }

    /// Decodes an element from JSON. Never fails; unknown shapes become `Unrecognized`.
    ///
    /// - a string is plain text;
    /// - an object with a string `event` field is a named event;
    /// - an object whose `content` is a string, or a list of `{"type": "text", "text": ..}`
    ///   parts, is a message chunk.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => StreamElement::PlainText(text),
            Value::Object(mut fields) => {
                if let Some(Value::String(event)) = fields.get("event") {
                    let kind = EventKind::from_wire(event);
                    let name = fields
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    let data = fields.remove("data").unwrap_or(Value::Null);
                    return StreamElement::Named(NamedEvent { kind, name, data });
                }
                match fields.get("content").and_then(content_text) {
                    Some(content) => StreamElement::MessageChunk(MessageChunk { content }),
                    None => StreamElement::Unrecognized(Value::Object(fields)),
                }
            }
            other => StreamElement::Unrecognized(other),
        }
    }

    /// Short stable name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            StreamElement::PlainText(_) => "plain_text",
            StreamElement::MessageChunk(_) => "message_chunk",
            StreamElement::Named(_) => "named_event",
            StreamElement::Unrecognized(_) => "unrecognized",
        }
    }
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let mut out = String::new();
            for part in parts {
                match part {
                    Value::String(text) => out.push_str(text),
                    Value::Object(fields)
                        if fields.get("type").and_then(Value::as_str) == Some("text") =>
                    {
                        if let Some(text) = fields.get("text").and_then(Value::as_str) {
                            out.push_str(text);
                        }
                    }
                    _ => {}
                }
            }
            Some(out)
        }
        _ => None,
    }
}
