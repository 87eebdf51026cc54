use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Named options carried alongside the input text on every backend call
/// (for example `thread_id`).
pub type Configurable = Map<String, Value>;

pub const DEFAULT_INPUT_KEY: &str = "input";

/// How the input text is presented to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum InputShape {
    /// Chain-style input: `{ <key>: <text> }`.
    Keyed { key: String },
    /// Graph-style input: `{ "messages": [{ "role": "user", "content": <text> }] }`.
    Messages,
}

impl Default for InputShape {
    fn default() -> Self {
        InputShape::Keyed {
            key: DEFAULT_INPUT_KEY.to_string(),
        }
    }
}

/// Input to one backend call. Built fresh for every trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub invocation_id: uuid::Uuid,
    pub text: String,
    /// Snapshot of the bridge's configuration mapping at invoke time.
    pub configurable: Configurable,
    pub input_shape: InputShape,
}

impl InvocationRequest {
    pub fn new(text: impl Into<String>, configurable: Configurable, input_shape: InputShape) -> Self {
        Self {
            invocation_id: uuid::Uuid::new_v4(),
            text: text.into(),
            configurable,
            input_shape,
        }
    }

    /// Backend input value laid out according to [`InputShape`].
    pub fn input_payload(&self) -> Value {
        match &self.input_shape {
            InputShape::Keyed { key } => {
                let mut map = Map::new();
                map.insert(key.clone(), Value::String(self.text.clone()));
                Value::Object(map)
            }
            InputShape::Messages => json!({
                "messages": [{ "role": "user", "content": self.text }]
            }),
        }
    }

    /// Run configuration value: `{ "configurable": { ... } }`.
    pub fn config_payload(&self) -> Value {
        json!({ "configurable": Value::Object(self.configurable.clone()) })
    }

    /// Reads one configuration value.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.configurable.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_input_uses_key() {
        let req = InvocationRequest::new(
            "hello",
            Configurable::new(),
            InputShape::Keyed {
                key: "question".into(),
            },
        );
        assert_eq!(req.input_payload(), json!({"question": "hello"}));
    }

    #[test]
    fn messages_input_wraps_text_as_user_message() {
        let req = InvocationRequest::new("hi", Configurable::new(), InputShape::Messages);
        assert_eq!(
            req.input_payload(),
            json!({"messages": [{"role": "user", "content": "hi"}]})
        );
    }

    #[test]
    fn config_payload_nests_configurable() {
        let mut configurable = Configurable::new();
        configurable.insert("thread_id".into(), json!("abc"));
        let req = InvocationRequest::new("hi", configurable, InputShape::default());
        assert_eq!(
            req.config_payload(),
            json!({"configurable": {"thread_id": "abc"}})
        );
        assert_eq!(req.option("thread_id"), Some(&json!("abc")));
    }
}
