use std::pin::Pin;

use crate::element::StreamElement;
use crate::errors::BackendError;
use crate::request::InvocationRequest;

/// Finite, single-consumption sequence of stream elements.
pub type ElementStream =
    Pin<Box<dyn futures::Stream<Item = Result<StreamElement, BackendError>> + Send + 'static>>;

/// Generative backend contract (LLM chain, agent graph, ...).
///
/// A backend may yield text-tier elements, event-graph elements, or both; the
/// bridge tells them apart by shape.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Stable backend name used in errors and logs.
    fn name(&self) -> &str;

    /// Opens the output stream for one invocation.
    ///
    /// Backends submit [`InvocationRequest::input_payload`] as the model input
    /// and [`InvocationRequest::config_payload`] as the run configuration.
    async fn start_stream(&self, request: InvocationRequest) -> Result<ElementStream, BackendError>;
}
