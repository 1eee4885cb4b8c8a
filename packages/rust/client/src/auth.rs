//! OAuth2 client-credentials tokens, cached per scope.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use cloudgraph_shared::{CloudGraphError, Result};

use crate::redact::{PathRedactor, redact_token_response};

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3599;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Client credentials for one tenant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login_endpoint: String,
    pub directory_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Fetches and caches bearer tokens.
pub struct TokenProvider {
    credentials: Credentials,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Bearer token for `scope`, fetched on first use and when near expiry.
    pub async fn token(
        &self,
        http: &Client,
        redactor: &PathRedactor,
        scope: &str,
    ) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.get(scope) {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.credentials.login_endpoint.trim_end_matches('/'),
            self.credentials.directory_id
        );
        let redacted_url = redactor.redact_url(&token_url);
        debug!(url = %redacted_url, scope, "requesting access token");

        let response = http
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await
            .map_err(|e| CloudGraphError::Network(format!("{redacted_url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudGraphError::Network(format!("{redacted_url}: {e}")))?;

        if !status.is_success() {
            return Err(CloudGraphError::Network(format!(
                "{redacted_url}: HTTP {status} while authenticating"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(body = %redact_token_response(&body), "unexpected token response");
            CloudGraphError::parse(format!("token response: {e}"))
        })?;

        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        let refresh_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);

        cache.insert(
            scope.to_string(),
            CachedToken {
                value: parsed.access_token.clone(),
                refresh_at,
            },
        );

        Ok(parsed.access_token)
    }
}
