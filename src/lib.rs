//! DeepSearch bridge
//!
//! An MCP stdio server that proxies a single "search" tool call to the
//! remote DeepSearch API: OAuth client-credentials auth with a cached
//! bearer token, one long-running search per invocation with liveness
//! progress notifications, timeout handling, and typed error classification.

pub mod auth;
pub mod config;
pub mod format;
pub mod logging;
pub mod progress;
pub mod search;
pub mod server;

use anyhow::{Context, Result};

/// Bridge entry point: configure, then serve stdio until the host closes
/// the channel.
pub async fn run() -> Result<()> {
    let _log_guard = logging::init()?;

    let config = config::Config::from_env().context("invalid configuration")?;

    tracing::info!(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64,
        "starting deepsearch bridge"
    );

    server::serve_stdio(&config).await
}
