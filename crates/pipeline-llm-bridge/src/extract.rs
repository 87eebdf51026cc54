use serde_json::Value;

use crate::element::StreamElement;

/// Canonical text of a stream element. Unknown shapes yield an empty string.
pub fn token_text(element: &StreamElement) -> &str {
    match element {
        StreamElement::PlainText(text) => text,
        StreamElement::MessageChunk(chunk) => &chunk.content,
        StreamElement::Named(_) | StreamElement::Unrecognized(_) => "",
    }
}

/// Same rule applied to a raw chunk payload nested inside a named event.
pub fn token_text_from_value(chunk: &Value) -> String {
    match StreamElement::from_json(chunk.clone()) {
        element @ (StreamElement::PlainText(_) | StreamElement::MessageChunk(_)) => {
            token_text(&element).to_string()
        }
        StreamElement::Named(_) | StreamElement::Unrecognized(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::EventKind;
    use serde_json::json;

    #[test]
    fn plain_and_chunk_normalize_identically() {
        assert_eq!(
            token_text(&StreamElement::text("same")),
            token_text(&StreamElement::chunk("same"))
        );
    }

    #[test]
    fn unknown_shapes_are_empty() {
        assert_eq!(token_text(&StreamElement::Unrecognized(json!(3))), "");
        assert_eq!(
            token_text(&StreamElement::named(EventKind::ToolEnd, json!({}))),
            ""
        );
    }

    #[test]
    fn nested_chunk_payloads() {
        assert_eq!(token_text_from_value(&json!({"content": "42"})), "42");
        assert_eq!(token_text_from_value(&json!("raw")), "raw");
        assert_eq!(token_text_from_value(&json!({"event": "on_tool_end"})), "");
        assert_eq!(token_text_from_value(&Value::Null), "");
    }
}
