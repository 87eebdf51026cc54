//! Built-in backend scripts, one per integration tier.

use clap::ValueEnum;
use pipeline_llm_bridge::{BackendError, EventKind, NamedEvent, ScriptEnd, ScriptedBackend, StreamElement};
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Text-streaming chain that answers in two tokens.
    Simple,
    /// Text-streaming chain that fails after its first token.
    Fault,
    /// Event-graph agent that calls a retriever tool.
    Graph,
}

impl Scenario {
    pub fn backend(self) -> ScriptedBackend {
        match self {
            Scenario::Simple => ScriptedBackend::from_texts("simple-chain", ["Hel", "lo"]),
            Scenario::Fault => ScriptedBackend::from_texts("faulty-chain", ["Hi"]).ending(
                ScriptEnd::Fail(BackendError::backend("faulty-chain", "model overloaded")),
            ),
            Scenario::Graph => ScriptedBackend::new(
                "agent-graph",
                vec![
                    StreamElement::Named(
                        NamedEvent::new(EventKind::ToolStart, json!({"input": {"query": "answer"}}))
                            .named("docs_retriever"),
                    ),
                    StreamElement::named(
                        EventKind::ModelStream,
                        json!({"chunk": {"content": "42"}}),
                    ),
                    StreamElement::named(
                        EventKind::RetrieverEnd,
                        json!({"output": {"documents": [
                            {"page_content": "The answer is 42.", "metadata": {"source": "guide.md"}},
                            {"page_content": "Don't panic.", "metadata": {"source": "cover.md", "page": null}}
                        ]}}),
                    ),
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_scenario_names_its_backend() {
        use pipeline_llm_bridge::Backend as _;
        assert_eq!(Scenario::Simple.backend().name(), "simple-chain");
        assert_eq!(Scenario::Fault.backend().name(), "faulty-chain");
        assert_eq!(Scenario::Graph.backend().name(), "agent-graph");
    }
}
