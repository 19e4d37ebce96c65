//! Authentication-gated session lifecycle
//!
//! The board may only load or mutate deals while the [`SessionManager`]
//! reports a signed-in identity.

pub mod cache;
pub mod manager;
pub mod state;

pub use cache::{CachedSession, SessionCache};
pub use manager::SessionManager;
pub use state::{SessionState, SessionStatus};
