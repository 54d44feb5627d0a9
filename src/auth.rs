use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::search::SearchError;

/// Tokens within this window of their expiry are treated as already expired,
/// guarding against clock skew with the remote service.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// OAuth client credentials, fixed for the process lifetime
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// The secret must never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// A bearer token with its absolute expiry
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_usable(&self, now: Instant) -> bool {
        self.expires_at.saturating_duration_since(now) > EXPIRY_BUFFER
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Obtains and caches bearer tokens via the client-credentials grant.
///
/// The cached token is process-wide state shared by all in-flight searches.
/// It is always replaced as a whole value, never mutated in place, and there
/// is no background refresh: a stale token is replaced lazily on next use.
pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
    credentials: Credentials,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            client,
            token_url: format!("{}/api/v1/oauth/token", base_url),
            credentials,
            cache: RwLock::new(None),
        }
    }

    /// Return a usable bearer token, exchanging credentials if the cached
    /// one is absent or within the expiry buffer.
    pub async fn access_token(&self) -> Result<String, SearchError> {
        if self.credentials.client_id.is_empty() || self.credentials.client_secret.is_empty() {
            return Err(SearchError::AuthConfig(
                "client id and secret must both be set".to_string(),
            ));
        }

        if let Some(token) = self.cached().await {
            tracing::trace!("reusing cached access token");
            return Ok(token);
        }

        self.exchange().await
    }

    /// Drop the cached token so the next call re-authenticates.
    ///
    /// Called when the search endpoint rejects a token the cache still
    /// considered valid.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        if cache.take().is_some() {
            tracing::debug!("cached access token invalidated");
        }
    }

    async fn cached(&self) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|token| token.is_usable(Instant::now()))
            .map(|token| token.access_token.clone())
    }

    async fn exchange(&self) -> Result<String, SearchError> {
        tracing::debug!(token_url = %self.token_url, "exchanging client credentials for access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();

            tracing::warn!(status = %status, "token exchange failed");

            return Err(SearchError::TokenExchange {
                status: status.as_u16(),
                detail: if detail.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    detail
                },
            });
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(body.expires_in);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at,
        });

        tracing::debug!(expires_in_secs = body.expires_in, "access token refreshed");

        Ok(body.access_token)
    }
}
