//! Common test utilities: a local mock of the DeepSearch API and a
//! progress sink that records everything it is handed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use deepsearch_bridge::auth::Credentials;
use deepsearch_bridge::config::Config;
use deepsearch_bridge::progress::ProgressSink;

/// How the mock search endpoint should respond.
#[derive(Clone)]
pub enum SearchBehavior {
    /// Respond 200 with this body.
    Ok(serde_json::Value),
    /// Respond with this status and JSON error body.
    Error(u16, serde_json::Value),
    /// Sleep, then respond 200 with this body.
    Delay(Duration, serde_json::Value),
}

struct ApiState {
    token_calls: AtomicUsize,
    search_calls: AtomicUsize,
    expires_in: u64,
    behavior: SearchBehavior,
}

/// A DeepSearch API stub bound to a random local port.
pub struct MockApi {
    pub base_url: String,
    state: Arc<ApiState>,
}

impl MockApi {
    pub async fn spawn(expires_in: u64, behavior: SearchBehavior) -> Self {
        let state = Arc::new(ApiState {
            token_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            expires_in,
            behavior,
        });

        let app = Router::new()
            .route("/api/v1/oauth/token", post(token_handler))
            .route("/api/v1/search", post(search_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("axum serve");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn token_calls(&self) -> usize {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.state.search_calls.load(Ordering::SeqCst)
    }

    /// Bridge config pointed at this mock.
    pub fn config(&self, timeout: Duration) -> Config {
        Config {
            base_url: self.base_url.clone(),
            credentials: Credentials::new("test-client", "test-secret"),
            timeout,
        }
    }
}

async fn token_handler(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("t{}", n),
        "expires_in": state.expires_in,
    }))
}

async fn search_handler(
    State(state): State<Arc<ApiState>>,
    Json(_body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.search_calls.fetch_add(1, Ordering::SeqCst);
    match state.behavior.clone() {
        SearchBehavior::Ok(body) => (StatusCode::OK, Json(body)),
        SearchBehavior::Error(status, body) => (
            StatusCode::from_u16(status).expect("valid status"),
            Json(body),
        ),
        SearchBehavior::Delay(delay, body) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(body))
        }
    }
}

/// Canned result used by the end-to-end tests.
pub fn quantum_result() -> serde_json::Value {
    json!({
        "query": "quantum computing",
        "answer": "Quantum computers exploit superposition and entanglement.",
        "sources": [
            { "index": 1, "title": "A", "url": "http://x", "snippet": "s" }
        ]
    })
}

/// Records every progress event it receives.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<(f64, f64, String)>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<(f64, f64, String)> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl ProgressSink for RecordingProgress {
    async fn emit(&self, progress: f64, total: f64, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((progress, total, message.to_string()));
    }
}
