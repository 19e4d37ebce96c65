//! Session state machine

use crate::abstractions::Identity;
use serde::{Deserialize, Serialize};

/// Authentication state of the running process.
///
/// `Loading` resolves exactly once to `SignedOut` or `SignedIn`. The only
/// way from `SignedOut` to `SignedIn` is a successful sign-in; there is no
/// way back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// The provider has not been asked yet
    Loading,
    /// No identity; the board is not available
    SignedOut,
    /// Board operations are allowed
    SignedIn(Identity),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Answer to a `get_session` query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    SignedIn(Identity),
    SignedOut,
}

impl From<SessionStatus> for SessionState {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::SignedIn(identity) => SessionState::SignedIn(identity),
            SessionStatus::SignedOut => SessionState::SignedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_predicates() {
        let state = SessionState::Loading;
        assert!(state.is_loading());
        assert!(!state.is_signed_in());
        assert_eq!(state.identity(), None);

        let identity = Identity::new("u1", Some("ben@fund.vc".to_string()));
        let state = SessionState::from(SessionStatus::SignedIn(identity.clone()));
        assert!(state.is_signed_in());
        assert_eq!(state.identity(), Some(&identity));

        let state = SessionState::from(SessionStatus::SignedOut);
        assert_eq!(state, SessionState::SignedOut);
    }
}
