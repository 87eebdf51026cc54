use std::time::Duration;

use crate::errors::BridgeError;
use crate::request::{DEFAULT_INPUT_KEY, InputShape};

const DEFAULT_END_MARKER_TIMEOUT: Duration = Duration::from_secs(1);

/// Behaviour options for a [`StreamingBridge`](crate::bridge::StreamingBridge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    pub input_shape: InputShape,
    /// Upper bound for one invocation. Expiry ends the response early.
    pub invocation_timeout: Option<Duration>,
    /// How long the end marker may wait on a stalled sink.
    pub end_marker_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            input_shape: InputShape::default(),
            invocation_timeout: None,
            end_marker_timeout: DEFAULT_END_MARKER_TIMEOUT,
        }
    }
}

impl BridgeOptions {
    pub fn input_shape(mut self, shape: InputShape) -> Self {
        self.input_shape = shape;
        self
    }

    /// Chain-style input under `key` (`{ key: text }`).
    pub fn input_key(self, key: impl Into<String>) -> Self {
        self.input_shape(InputShape::Keyed { key: key.into() })
    }

    pub fn invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = Some(timeout);
        self
    }

    pub fn end_marker_timeout(mut self, timeout: Duration) -> Self {
        self.end_marker_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if let InputShape::Keyed { key } = &self.input_shape
            && key.trim().is_empty()
        {
            return Err(BridgeError::Config("input key must not be empty".into()));
        }
        if self.end_marker_timeout.is_zero() {
            return Err(BridgeError::Config(
                "end_marker_timeout must be greater than 0".into(),
            ));
        }
        if self.invocation_timeout.is_some_and(|t| t.is_zero()) {
            return Err(BridgeError::Config(
                "invocation_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Reads options from the process environment.
    ///
    /// - `BRIDGE_INPUT_SHAPE`: `keyed` (default) or `messages`.
    /// - `BRIDGE_INPUT_KEY`: key for keyed input (default `input`).
    /// - `BRIDGE_INVOCATION_TIMEOUT_MS`: optional invocation timeout.
    /// - `BRIDGE_END_MARKER_TIMEOUT_MS`: end marker timeout (default 1000).
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        let key = lookup("BRIDGE_INPUT_KEY").unwrap_or_else(|| DEFAULT_INPUT_KEY.to_string());
        options.input_shape = match lookup("BRIDGE_INPUT_SHAPE")
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("keyed") => InputShape::Keyed { key },
            Some("messages") => InputShape::Messages,
            Some(other) => {
                return Err(BridgeError::Config(format!(
                    "BRIDGE_INPUT_SHAPE must be `keyed` or `messages`, got `{other}`"
                )));
            }
        };
        if let Some(ms) = parse_millis(&lookup, "BRIDGE_INVOCATION_TIMEOUT_MS")? {
            options.invocation_timeout = Some(ms);
        }
        if let Some(ms) = parse_millis(&lookup, "BRIDGE_END_MARKER_TIMEOUT_MS")? {
            options.end_marker_timeout = ms;
        }
        options.validate()?;
        Ok(options)
    }
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, BridgeError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| BridgeError::Config(format!("{key} must be milliseconds: {e}"))),
    }
}
