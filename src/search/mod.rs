pub mod client;

pub use client::SearchClient;

use serde::Deserialize;

/// A completed search: synthesized answer plus supporting material.
///
/// Decoded straight from the search endpoint's response body. Everything
/// beyond the answer itself is optional and tolerated when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    /// The query as the service understood it
    pub query: String,
    /// Synthesized answer text
    pub answer: String,
    /// Supporting sources, in citation order
    #[serde(default)]
    pub sources: Vec<Source>,
    /// How the search was executed
    #[serde(default)]
    pub metadata: Option<SearchMetadata>,
    /// Billing counters for this call
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A single cited source
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    /// 1-based citation index
    pub index: u32,
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Which upstream provider produced this hit
    #[serde(default)]
    pub provider: Option<String>,
    /// Extracted page content, when the service fetched it
    #[serde(default)]
    pub content: Option<String>,
}

/// Execution details reported by the service
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub providers_used: Vec<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub deduplicated_results: Option<u64>,
    #[serde(default)]
    pub paid_apis_used: bool,
    #[serde(default)]
    pub gaps_identified: Option<Vec<String>>,
    #[serde(default)]
    pub refined_queries: Option<Vec<String>>,
    #[serde(default)]
    pub elapsed_time_ms: u64,
}

/// Credit accounting for a single call
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub credits_charged: f64,
    pub credits_remaining: f64,
    pub plan: String,
}

/// Search-related errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Client credentials are not configured: {0}")]
    AuthConfig(String),

    #[error("Token exchange failed with status {status}: {detail}")]
    TokenExchange { status: u16, detail: String },

    #[error("Authentication failed: {0}. Check DEEPSEARCH_CLIENT_ID and DEEPSEARCH_CLIENT_SECRET")]
    Authentication(String),

    #[error("Insufficient credits: {0}. Add credits or upgrade your plan")]
    InsufficientCredits(String),

    #[error("Rate limit exceeded: {0}. Wait a moment and try again")]
    RateLimited(String),

    #[error("Search API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Search timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
