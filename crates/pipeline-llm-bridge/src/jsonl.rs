//! Backend that replays recorded output from a JSON-lines file, one element per line.

use std::path::PathBuf;

use futures::stream;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::debug;

use crate::backend::{Backend, ElementStream};
use crate::element::StreamElement;
use crate::errors::BackendError;
use crate::request::InvocationRequest;

pub struct JsonLinesBackend {
    name: String,
    path: PathBuf,
}

impl JsonLinesBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "jsonl".to_string(),
            path: path.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait::async_trait]
impl Backend for JsonLinesBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start_stream(&self, request: InvocationRequest) -> Result<ElementStream, BackendError> {
        debug!(
            event = "bridge.jsonl_open",
            domain = "bridge",
            backend = %self.name,
            invocation_id = %request.invocation_id,
            path = %self.path.display(),
            input = %request.input_payload(),
            config = %request.config_payload(),
            "replaying recorded backend output"
        );
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            BackendError::transport(
                self.name.clone(),
                format!("failed to open {}: {e}", self.path.display()),
            )
        })?;

        let name = self.name.clone();
        let lines = BufReader::new(file).lines();
        let stream = stream::unfold(Some(lines), move |state| {
            let name = name.clone();
            async move {
                let mut lines = state?;
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            return match serde_json::from_str::<serde_json::Value>(line) {
                                Ok(value) => Some((Ok(StreamElement::from_json(value)), Some(lines))),
                                Err(e) => Some((
                                    Err(BackendError::protocol(name, format!("invalid JSON line: {e}"))),
                                    None,
                                )),
                            };
                        }
                        Ok(None) => return None,
                        Err(e) => {
                            return Some((
                                Err(BackendError::transport(name, format!("read failed: {e}"))),
                                None,
                            ));
                        }
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::EventKind;
    use crate::request::{Configurable, InputShape};
    use futures::StreamExt as _;
    use std::io::Write as _;

    fn request() -> InvocationRequest {
        InvocationRequest::new("q", Configurable::new(), InputShape::Messages)
    }

    #[tokio::test]
    async fn reads_elements_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\"Hel\"").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"content\": \"lo\"}}").unwrap();
        writeln!(file, "{{\"event\": \"on_tool_end\", \"data\": {{}}}}").unwrap();

        let backend = JsonLinesBackend::new(file.path());
        let items: Vec<_> = backend.start_stream(request()).await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Ok(StreamElement::text("Hel")));
        assert_eq!(items[1], Ok(StreamElement::chunk("lo")));
        assert!(matches!(&items[2], Ok(StreamElement::Named(e)) if e.kind == EventKind::ToolEnd));
    }

    #[tokio::test]
    async fn invalid_line_ends_stream_with_protocol_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\"ok\"").unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, "\"never read\"").unwrap();

        let backend = JsonLinesBackend::new(file.path()).with_name("replay");
        let items: Vec<_> = backend.start_stream(request()).await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(BackendError::Protocol { backend, .. }) if backend == "replay"));
    }

    #[tokio::test]
    async fn missing_file_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonLinesBackend::new(dir.path().join("missing.jsonl"));
        assert!(matches!(
            backend.start_stream(request()).await,
            Err(BackendError::Transport { .. })
        ));
    }
}
