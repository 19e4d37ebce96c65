//! Supabase-backed collaborators
//!
//! [`SupabaseClient`] talks to a Supabase project over HTTP: GoTrue for
//! password sign-in and PostgREST for the deal table. It implements both
//! [`IdentityProvider`](crate::abstractions::IdentityProvider) and
//! [`DealPersistence`](crate::abstractions::DealPersistence). Requests are
//! sent once, with no timeout and no retry.

mod auth;
mod rest;

use crate::config::SupabaseSettings;
use crate::error::{BoardError, BoardResult, RemoteError, RemoteResult};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Tokens issued by a successful password grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// HTTP client for one Supabase project and one deal table
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    table: String,
    tokens: RwLock<Option<AuthTokens>>,
}

impl SupabaseClient {
    pub fn new(settings: &SupabaseSettings) -> BoardResult<Self> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| BoardError::Config("supabase.url is not set".to_string()))?;
        let anon_key = settings
            .anon_key
            .clone()
            .ok_or_else(|| BoardError::Config("supabase.anon_key is not set".to_string()))?;

        let mut base_url = Url::parse(url)
            .map_err(|e| BoardError::Config(format!("invalid supabase.url '{url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key,
            table: settings.table.clone(),
            tokens: RwLock::new(None),
        })
    }

    /// Reuse tokens from an earlier sign-in
    pub async fn set_tokens(&self, tokens: Option<AuthTokens>) {
        *self.tokens.write().await = tokens;
    }

    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.tokens.read().await.clone()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Other(anyhow::anyhow!("invalid endpoint {path}: {e}")))
    }

    fn table_url(&self) -> RemoteResult<Url> {
        self.endpoint(&format!("rest/v1/{}", self.table))
    }

    /// Request carrying the project key and, when signed in, the user token
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = match self.tokens.read().await.as_ref() {
            Some(tokens) => tokens.access_token.clone(),
            None => self.anon_key.clone(),
        };
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send and turn any non-2xx answer into a [`RemoteError::Status`]
    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await.map_err(RemoteError::transport)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::status(status.as_u16(), error_message(&body)))
    }
}

/// Human-readable message from a GoTrue or PostgREST error body
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "error_description", "message", "error"] {
            if let Some(Value::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "no error details returned".to_string()
    } else {
        body.to_string()
    }
}
