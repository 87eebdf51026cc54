use std::fmt;

/// Errors raised by a [`Backend`](crate::backend::Backend) while opening or
/// draining its element stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Backend returned an application-level failure.
    #[error("backend error ({backend}): {message}")]
    Backend { backend: String, message: String },
    /// Transport or stream I/O failed.
    #[error("transport error ({backend}): {message}")]
    Transport { backend: String, message: String },
    /// Backend output could not be understood at all.
    #[error("protocol error ({backend}): {message}")]
    Protocol { backend: String, message: String },
}

impl BackendError {
    /// Creates a backend-level error.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the backend that raised this error.
    pub fn backend_name(&self) -> &str {
        match self {
            Self::Backend { backend, .. }
            | Self::Transport { backend, .. }
            | Self::Protocol { backend, .. } => backend,
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Backend { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. } => message,
        }
    }
}

/// Why a stream was torn down before the backend finished it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The bridge's abort handle fired (pipeline teardown or interruption).
    Cancelled,
    /// The configured invocation timeout elapsed.
    TimedOut,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Cancelled => f.write_str("cancelled"),
            CloseReason::TimedOut => f.write_str("timed out"),
        }
    }
}

/// A fault contained by the bridge. The response still ends with an end marker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamFault {
    #[error("stream closed prematurely: {0}")]
    ClosedPrematurely(CloseReason),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors in bridge setup. Nothing raised while streaming ends up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Invalid bridge options or environment.
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_every_variant() {
        for err in [
            BackendError::backend("graph", "boom"),
            BackendError::transport("graph", "boom"),
            BackendError::protocol("graph", "boom"),
        ] {
            assert_eq!(err.backend_name(), "graph");
            assert_eq!(err.message(), "boom");
        }
    }

    #[test]
    fn stream_fault_display_is_readable() {
        let fault = StreamFault::ClosedPrematurely(CloseReason::TimedOut);
        assert_eq!(fault.to_string(), "stream closed prematurely: timed out");
        let fault = StreamFault::from(BackendError::transport("chain", "reset"));
        assert_eq!(fault.to_string(), "transport error (chain): reset");
    }
}
