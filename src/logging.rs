use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const FILTER_VAR: &str = "DEEPSEARCH_LOG";
const LOG_FILE_VAR: &str = "DEEPSEARCH_LOG_FILE";

#[allow(dead_code)]
pub struct LogGuard(tracing_appender::non_blocking::WorkerGuard);

/// Initialize logging.
///
/// stdout carries the MCP channel, so log output goes to stderr by default,
/// or to the file named by `DEEPSEARCH_LOG_FILE` when set. The filter comes
/// from `DEEPSEARCH_LOG` (env-filter syntax); the default is debug for this
/// crate and warn for everything else.
pub fn init() -> Result<LogGuard> {
    let filter = match std::env::var(FILTER_VAR) {
        Ok(raw) => EnvFilter::try_new(raw).unwrap_or_else(|_| EnvFilter::new("warn")),
        Err(_) => EnvFilter::new("deepsearch_bridge=debug,warn"),
    };

    let (writer, guard) = match log_file_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .try_init()
        .ok(); // If already initialized (e.g., in tests), don't crash.

    Ok(LogGuard(guard))
}

fn log_file_path() -> Option<PathBuf> {
    std::env::var(LOG_FILE_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
