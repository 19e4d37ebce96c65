//! Session manager implementation

use super::{SessionState, SessionStatus};
use crate::abstractions::{Identity, IdentityProvider};
use crate::error::{BoardError, BoardResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the authentication state and gates the board on it
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: SessionState,
}

impl SessionManager {
    /// Create a manager in the `Loading` state
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: SessionState::Loading,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Identity of the signed-in user, or `NotSignedIn`
    pub fn require_identity(&self) -> BoardResult<&Identity> {
        self.state.identity().ok_or(BoardError::NotSignedIn)
    }

    /// Ask the provider whether a session already exists.
    ///
    /// Pure query: the manager's state is not touched. A provider that
    /// cannot be reached is reported as signed out.
    pub async fn get_session(&self) -> SessionStatus {
        match self.provider.current_identity().await {
            Ok(Some(identity)) => SessionStatus::SignedIn(identity),
            Ok(None) => SessionStatus::SignedOut,
            Err(e) => {
                warn!("Could not query identity provider, treating as signed out: {}", e);
                SessionStatus::SignedOut
            }
        }
    }

    /// Resolve the initial `Loading` state from the provider.
    ///
    /// Only the first call queries; afterwards the current state is returned.
    pub async fn restore(&mut self) -> &SessionState {
        if self.state.is_loading() {
            let status = self.get_session().await;
            self.state = status.into();
            match &self.state {
                SessionState::SignedIn(identity) => {
                    info!("Restored session for {}", identity.display_name())
                }
                _ => debug!("No existing session"),
            }
        }
        &self.state
    }

    /// Submit credentials to the provider.
    ///
    /// On failure the state is `SignedOut` and the provider's message is
    /// returned as [`BoardError::Auth`].
    pub async fn sign_in(&mut self, email: &str, password: &str) -> BoardResult<Identity> {
        if let SessionState::SignedIn(identity) = &self.state {
            return Err(BoardError::AlreadySignedIn(
                identity.display_name().to_string(),
            ));
        }

        match self.provider.sign_in(email, password).await {
            Ok(identity) => {
                info!("Signed in as {}", identity.display_name());
                self.state = SessionState::SignedIn(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                warn!("Sign-in failed for {}: {}", email, e);
                self.state = SessionState::SignedOut;
                Err(e.into())
            }
        }
    }
}
