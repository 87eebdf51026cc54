use serde_json::Value;

use crate::element::{EventKind, NamedEvent};
use crate::extract::token_text_from_value;

/// What the bridge does with one named event.
#[derive(Clone, Debug, PartialEq)]
pub enum Policy {
    /// Emit the token, framed on its own.
    ModelToken(String),
    /// Record the tool invocation; nothing goes downstream.
    LogToolStart { name: Option<String>, input: Value },
    /// Tool finished. Not propagated downstream.
    ToolEnd { name: Option<String> },
    /// Emit one tool result per document, in order.
    Documents(Vec<Value>),
    /// The event kind is known but its payload is not usable.
    Malformed { reason: &'static str },
    Ignore,
}

pub fn classify(event: &NamedEvent) -> Policy {
    match &event.kind {
        EventKind::ModelStream => {
            let chunk = event.data.get("chunk").unwrap_or(&Value::Null);
            Policy::ModelToken(token_text_from_value(chunk))
        }
        EventKind::ToolStart => Policy::LogToolStart {
            name: event.name.clone(),
            input: event.data.get("input").cloned().unwrap_or(Value::Null),
        },
        EventKind::ToolEnd => Policy::ToolEnd {
            name: event.name.clone(),
        },
        EventKind::RetrieverEnd => match event.data.pointer("/output/documents") {
            Some(Value::Array(docs)) => {
                Policy::Documents(docs.iter().cloned().map(strip_nulls).collect())
            }
            Some(_) => Policy::Malformed {
                reason: "retriever documents is not a list",
            },
            None => Policy::Malformed {
                reason: "retriever event has no output.documents",
            },
        },
        EventKind::Other(_) => Policy::Ignore,
    }
}

/// Drops `null` object fields, recursively.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_stream_extracts_chunk_text() {
        let event = NamedEvent::new(
            EventKind::ModelStream,
            json!({"chunk": {"content": "42"}}),
        );
        assert_eq!(classify(&event), Policy::ModelToken("42".into()));
    }

    #[test]
    fn model_stream_without_chunk_is_empty_token() {
        let event = NamedEvent::new(EventKind::ModelStream, json!({}));
        assert_eq!(classify(&event), Policy::ModelToken(String::new()));
    }

    #[test]
    fn tool_start_carries_name_and_input() {
        let event = NamedEvent::new(EventKind::ToolStart, json!({"input": {"q": "x"}})).named("search");
        assert_eq!(
            classify(&event),
            Policy::LogToolStart {
                name: Some("search".into()),
                input: json!({"q": "x"})
            }
        );
    }

    #[test]
    fn retriever_documents_keep_order_and_drop_nulls() {
        let event = NamedEvent::new(
            EventKind::RetrieverEnd,
            json!({"output": {"documents": [
                {"page_content": "D1", "id": null, "metadata": {"source": "a", "page": null}},
                {"page_content": "D2"}
            ]}}),
        );
        assert_eq!(
            classify(&event),
            Policy::Documents(vec![
                json!({"page_content": "D1", "metadata": {"source": "a"}}),
                json!({"page_content": "D2"}),
            ])
        );
    }

    #[test]
    fn retriever_without_documents_is_malformed() {
        let event = NamedEvent::new(EventKind::RetrieverEnd, json!({"output": {}}));
        assert!(matches!(classify(&event), Policy::Malformed { .. }));
        let event = NamedEvent::new(EventKind::RetrieverEnd, json!({"output": {"documents": 1}}));
        assert!(matches!(classify(&event), Policy::Malformed { .. }));
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        let event = NamedEvent::new(EventKind::Other("on_chain_end".into()), json!({}));
        assert_eq!(classify(&event), Policy::Ignore);
    }
}
