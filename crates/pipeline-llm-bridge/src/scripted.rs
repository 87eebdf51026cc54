//! Backend that replays a fixed element script. Used by the demo binary and tests.

use std::sync::Arc;

use futures::StreamExt as _;
use futures::stream;
use tokio::sync::Mutex;

use crate::backend::{Backend, ElementStream};
use crate::element::StreamElement;
use crate::errors::BackendError;
use crate::request::InvocationRequest;

/// What happens after the last scripted element.
#[derive(Clone, Debug, Default)]
pub enum ScriptEnd {
    /// Stream ends normally.
    #[default]
    Finish,
    /// Stream yields this error.
    Fail(BackendError),
    /// Stream never yields again.
    Hang,
}

#[derive(Clone)]
pub struct ScriptedBackend {
    name: String,
    script: Vec<StreamElement>,
    end: ScriptEnd,
    open_error: Option<BackendError>,
    requests: Arc<Mutex<Vec<InvocationRequest>>>,
}

impl ScriptedBackend {
    pub fn new(name: impl Into<String>, script: Vec<StreamElement>) -> Self {
        Self {
            name: name.into(),
            script,
            end: ScriptEnd::Finish,
            open_error: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience for text-tier scripts.
    pub fn from_texts<I, S>(name: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, texts.into_iter().map(StreamElement::text).collect())
    }

    pub fn ending(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// Makes `start_stream` fail before any element is produced.
    pub fn failing_on_open(mut self, error: BackendError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Requests received so far, in call order.
    pub async fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start_stream(&self, request: InvocationRequest) -> Result<ElementStream, BackendError> {
        self.requests.lock().await.push(request);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        let elements = stream::iter(self.script.clone().into_iter().map(Ok));
        let stream: ElementStream = match self.end.clone() {
            ScriptEnd::Finish => Box::pin(elements),
            ScriptEnd::Fail(err) => Box::pin(elements.chain(stream::once(async move { Err(err) }))),
            ScriptEnd::Hang => Box::pin(elements.chain(stream::pending())),
        };
        Ok(stream)
    }
}
