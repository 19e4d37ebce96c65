//! Identity provider abstraction layer

use crate::error::{AuthError, RemoteError, RemoteResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The signed-in user as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Email when known, otherwise the provider id
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Trait for the external authentication service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity of the current session, if one exists
    async fn current_identity(&self) -> RemoteResult<Option<Identity>>;

    /// Exchange credentials for an identity
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Mock implementation of IdentityProvider for testing
pub struct MockIdentityProvider {
    /// Identity returned by `current_identity`
    pub current: Arc<Mutex<Option<Identity>>>,
    /// Accepted credentials: email -> (password, identity)
    accounts: HashMap<String, (String, Identity)>,
    /// Make `current_identity` fail instead of answering
    pub unavailable: bool,
    /// Track sign-in attempts (emails) for verification
    pub sign_in_attempts: Arc<Mutex<Vec<String>>>,
}

impl MockIdentityProvider {
    /// Provider with no session and no accounts
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            accounts: HashMap::new(),
            unavailable: false,
            sign_in_attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider that already has a session for `identity`
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: Arc::new(Mutex::new(Some(identity))),
            ..Self::new()
        }
    }

    /// Register an account that `sign_in` will accept
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        let identity = Identity::new(
            format!("user-{}", self.accounts.len() + 1),
            Some(email.to_string()),
        );
        self.accounts
            .insert(email.to_string(), (password.to_string(), identity));
        self
    }

    /// Get the list of emails used in sign-in attempts
    pub async fn get_sign_in_attempts(&self) -> Vec<String> {
        self.sign_in_attempts.lock().await.clone()
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_identity(&self) -> RemoteResult<Option<Identity>> {
        if self.unavailable {
            return Err(RemoteError::transport("identity provider unavailable"));
        }
        Ok(self.current.lock().await.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.sign_in_attempts.lock().await.push(email.to_string());

        match self.accounts.get(email) {
            Some((expected, identity)) if expected == password => {
                *self.current.lock().await = Some(identity.clone());
                Ok(identity.clone())
            }
            _ => Err(AuthError::new("Invalid login credentials")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sign_in() {
        let provider = MockIdentityProvider::new().with_account("tom@fund.vc", "hunter2");
        assert_eq!(provider.current_identity().await.unwrap(), None);

        let err = provider.sign_in("tom@fund.vc", "wrong").await.unwrap_err();
        assert_eq!(err.message, "Invalid login credentials");

        let identity = provider.sign_in("tom@fund.vc", "hunter2").await.unwrap();
        assert_eq!(identity.display_name(), "tom@fund.vc");
        assert_eq!(provider.current_identity().await.unwrap(), Some(identity));
        assert_eq!(provider.get_sign_in_attempts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let mut provider = MockIdentityProvider::new();
        provider.unavailable = true;
        assert!(provider.current_identity().await.is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let identity = Identity::new("abc-123", None);
        assert_eq!(identity.display_name(), "abc-123");
    }
}
