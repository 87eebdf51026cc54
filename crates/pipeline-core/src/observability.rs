//! Process-wide tracing setup for pipeline binaries.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_LOG_FILE: &str = "pipeline.logs.jsonl";
const DEFAULT_DIRECTIVE: &str = "info";

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    Off,
    /// Compact text on stderr; stdout is left to pipeline output.
    Stderr,
    /// One JSON object per line, appended to `dir/file_name`.
    JsonFile { dir: PathBuf, file_name: String },
}

impl LogTarget {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("PIPELINE_OBSERVABILITY_ENABLED")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);
        if !enabled {
            return LogTarget::Off;
        }
        match lookup("PIPELINE_JSON_LOG_PATH") {
            Some(raw) if !raw.trim().is_empty() => {
                let path = PathBuf::from(raw.trim());
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."))
                    .to_path_buf();
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(DEFAULT_LOG_FILE)
                    .to_string();
                LogTarget::JsonFile { dir, file_name }
            }
            _ => LogTarget::Stderr,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// First parsable directive among `PIPELINE_LOG_LEVEL` and `RUST_LOG`.
fn filter_directive<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["PIPELINE_LOG_LEVEL", "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|directive| EnvFilter::try_new(directive).is_ok())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

/// Initialize logging once per process.
///
/// - `PIPELINE_OBSERVABILITY_ENABLED`: set to `false`/`off`/`0` to disable.
/// - `PIPELINE_LOG_LEVEL`: filter directive, e.g. `pipeline_llm_bridge=debug`.
///   Falls back to `RUST_LOG`, then `info`.
/// - `PIPELINE_JSON_LOG_PATH`: write JSON lines to this file instead of stderr.
pub fn init_observability() {
    INIT.get_or_init(|| {
        let lookup = |key: &str| std::env::var(key).ok();
        let filter = EnvFilter::new(filter_directive(&lookup));
        match LogTarget::from_lookup(&lookup) {
            LogTarget::Off => {}
            LogTarget::Stderr => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
            }
            LogTarget::JsonFile { dir, file_name } => {
                let _ = std::fs::create_dir_all(&dir);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(tracing_appender::rolling::never(dir, file_name));
                let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
            }
        }
    });
}
