use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::progress::ProgressSink;
use crate::search::{SearchError, SearchResult};

/// Liveness ticker period. The ticker exists solely to keep the host channel
/// visibly alive during a 30-60 second remote call; its values say nothing
/// about actual remote progress.
const TICK_PERIOD: Duration = Duration::from_secs(10);

const TICK_START: u64 = 5;
const TICK_STEP: u64 = 5;
const TICK_CAP: u64 = 90;

const LIVENESS_PHASES: [&str; 6] = [
    "Analyzing query...",
    "Searching across providers...",
    "Retrieving results...",
    "Deduplicating and ranking...",
    "Extracting content...",
    "Synthesizing answer...",
];

/// Map the ticker counter onto one of the phase descriptions.
fn phase_message(counter: u64) -> &'static str {
    let idx = (counter as usize * LIVENESS_PHASES.len()) / 100;
    LIVENESS_PHASES[idx.min(LIVENESS_PHASES.len() - 1)]
}

/// Recurring progress emitter, torn down on drop.
///
/// Every exit path of `execute` (success, remote error, timeout) drops this
/// guard, so the spawned timer can never outlive the call it belongs to.
struct LivenessTicker {
    handle: JoinHandle<()>,
}

impl LivenessTicker {
    fn spawn(progress: Arc<dyn ProgressSink>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            let mut counter = TICK_START;
            loop {
                interval.tick().await;
                progress
                    .emit(counter as f64, 100.0, phase_message(counter))
                    .await;
                counter = (counter + TICK_STEP).min(TICK_CAP);
            }
        });
        Self { handle }
    }
}

impl Drop for LivenessTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Issues the proxied search call: token, timeout, liveness ticking, and
/// error classification. One attempt per call; retry policy belongs to the
/// caller.
pub struct SearchClient {
    client: reqwest::Client,
    search_url: String,
    tokens: Arc<TokenProvider>,
    timeout: Duration,
    tick_period: Duration,
}

impl SearchClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let tokens = Arc::new(TokenProvider::new(
            client.clone(),
            &config.base_url,
            config.credentials.clone(),
        ));
        Self {
            client,
            search_url: format!("{}/api/v1/search", config.base_url),
            tokens,
            timeout: config.timeout,
            tick_period: TICK_PERIOD,
        }
    }

    /// Shrink the ticker period so tests can observe ticks without waiting
    /// tens of seconds of wall-clock time.
    #[doc(hidden)]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Run a single search, reporting progress through `progress`.
    pub async fn execute(
        &self,
        query: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<SearchResult, SearchError> {
        let token = self.tokens.access_token().await?;

        progress.emit(0.0, 100.0, "Starting search...").await;

        let ticker = LivenessTicker::spawn(Arc::clone(&progress), self.tick_period);

        progress
            .emit(10.0, 100.0, "Sending query to DeepSearch...")
            .await;

        tracing::debug!(query = %query, timeout_ms = self.timeout.as_millis() as u64, "sending search request");

        let send = self
            .client
            .post(&self.search_url)
            .bearer_auth(&token)
            .json(&json!({ "query": query }))
            .send();

        // The ticker must be gone before we classify or decode anything.
        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => {
                drop(ticker);
                response
            }
            Ok(Err(e)) => {
                drop(ticker);
                return Err(e.into());
            }
            Err(_) => {
                drop(ticker);
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!(timeout_ms = ms, "search timed out");
                return Err(SearchError::Timeout(ms));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_else(|_| json!({}));
            let detail = body
                .get("detail")
                .and_then(|v| v.as_str())
                .or_else(|| body.get("message").and_then(|v| v.as_str()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
                .to_string();

            tracing::warn!(status = %status, detail = %detail, "search api returned error");

            return Err(match status.as_u16() {
                401 => {
                    // The remote just rejected this token; force a fresh
                    // exchange on the next call.
                    self.tokens.invalidate().await;
                    SearchError::Authentication(detail)
                }
                402 => SearchError::InsufficientCredits(detail),
                429 => SearchError::RateLimited(detail),
                _ => SearchError::Api {
                    status: status.as_u16(),
                    detail,
                },
            });
        }

        progress.emit(95.0, 100.0, "Formatting results...").await;

        let result: SearchResult = response.json().await?;

        tracing::debug!(
            query = %query,
            sources = result.sources.len(),
            "search completed"
        );

        progress.emit(100.0, 100.0, "Search complete").await;

        Ok(result)
    }
}
