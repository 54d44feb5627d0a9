use std::time::Duration;

use crate::auth::Credentials;

/// Production API endpoint, used when `DEEPSEARCH_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://api.deepsearch.ai";

/// Default search timeout in milliseconds (5 minutes).
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

const BASE_URL_VAR: &str = "DEEPSEARCH_BASE_URL";
const CLIENT_ID_VAR: &str = "DEEPSEARCH_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "DEEPSEARCH_CLIENT_SECRET";
const TIMEOUT_VAR: &str = "DEEPSEARCH_TIMEOUT_MS";

/// Configuration errors raised at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set. Export your DeepSearch client credentials before starting the bridge")]
    MissingVar(&'static str),

    #[error("{var} must be a positive integer (milliseconds), got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Bridge configuration, sourced from the environment once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the DeepSearch API (no trailing slash)
    pub base_url: String,

    /// OAuth client credentials
    pub credentials: Credentials,

    /// Deadline for a single search call
    pub timeout: Duration,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `DEEPSEARCH_CLIENT_ID` and `DEEPSEARCH_CLIENT_SECRET` are required;
    /// a missing value is fatal at startup. Whitespace-only values count as
    /// missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BASE_URL_VAR)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client_id = require_var(CLIENT_ID_VAR)?;
        let client_secret = require_var(CLIENT_SECRET_VAR)?;

        let timeout = match std::env::var(TIMEOUT_VAR) {
            Ok(raw) => {
                let raw = raw.trim().to_string();
                match raw.parse::<u64>() {
                    Ok(ms) if ms > 0 => Duration::from_millis(ms),
                    _ => {
                        return Err(ConfigError::InvalidTimeout {
                            var: TIMEOUT_VAR,
                            value: raw,
                        })
                    }
                }
            }
            Err(_) => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        Ok(Self {
            base_url,
            credentials: Credentials::new(client_id, client_secret),
            timeout,
        })
    }
}

fn require_var(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}
