use super::{AuthTokens, SupabaseClient};
use crate::abstractions::{Identity, IdentityProvider};
use crate::error::{AuthError, RemoteError, RemoteResult};
use crate::session::CachedSession;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserResponse> for Identity {
    fn from(user: UserResponse) -> Self {
        Identity::new(user.id, user.email)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserResponse,
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn current_identity(&self) -> RemoteResult<Option<Identity>> {
        if self.tokens.read().await.is_none() {
            return Ok(None);
        }

        let url = self.endpoint("auth/v1/user")?;
        let request = self.request(Method::GET, url).await;
        match self.send(request).await {
            Ok(response) => {
                let user: UserResponse =
                    response.json().await.map_err(RemoteError::serialization)?;
                Ok(Some(user.into()))
            }
            // expired or revoked token
            Err(RemoteError::Status { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut url = self
            .endpoint("auth/v1/token")
            .map_err(|e| AuthError::new(e.to_string()))?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));

        self.grant(request).await
    }
}

impl SupabaseClient {
    /// Exchange the stored refresh token for a fresh access token.
    ///
    /// On success the new tokens replace the old ones.
    pub async fn refresh_session(&self) -> Result<Identity, AuthError> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|tokens| tokens.refresh_token.clone())
            .ok_or_else(|| AuthError::new("no refresh token available"))?;

        let mut url = self
            .endpoint("auth/v1/token")
            .map_err(|e| AuthError::new(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));

        let identity = self.grant(request).await?;
        debug!("Refreshed session for {}", identity.display_name());
        Ok(identity)
    }

    /// Reinstate a cached session, refreshing it if the access token expired.
    ///
    /// Returns the session worth caching from now on, or `None` when the
    /// cached one can no longer be used and the user has to sign in again.
    pub async fn resume(&self, cached: CachedSession) -> RemoteResult<Option<CachedSession>> {
        self.set_tokens(Some(AuthTokens {
            access_token: cached.access_token.clone(),
            refresh_token: cached.refresh_token.clone(),
        }))
        .await;

        if self.current_identity().await?.is_some() {
            return Ok(Some(cached));
        }
        if cached.refresh_token.is_none() {
            debug!("Cached access token expired and no refresh token was issued");
            self.set_tokens(None).await;
            return Ok(None);
        }

        match self.refresh_session().await {
            Ok(identity) => Ok(self.tokens().await.map(|tokens| {
                CachedSession::new(tokens.access_token, tokens.refresh_token, identity)
            })),
            Err(e) => {
                warn!("Could not refresh cached session: {}", e);
                self.set_tokens(None).await;
                Ok(None)
            }
        }
    }

    /// Send a token grant and store the issued tokens
    async fn grant(&self, request: RequestBuilder) -> Result<Identity, AuthError> {
        let response = self.send(request).await.map_err(|e| match e {
            RemoteError::Status { message, .. } => AuthError::new(message),
            other => AuthError::new(other.to_string()),
        })?;
        let granted: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::new(format!("unexpected token response: {e}")))?;

        self.set_tokens(Some(AuthTokens {
            access_token: granted.access_token,
            refresh_token: granted.refresh_token,
        }))
        .await;
        Ok(granted.user.into())
    }
}
