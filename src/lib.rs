//! # Dealboard
//!
//! A stage-ordered deal pipeline kept in sync with a remote table.
//!
//! ## Usage
//!
//! ```bash
//! dealboard login --email tom@fund.vc
//! dealboard list [--stage "Partner Call"]
//! dealboard set 42 stage Memo
//! ```
//!
//! ## Modules
//!
//! - `abstractions` - Trait-based abstractions for the remote table and identity provider
//! - `app` - The `Board` application context tying session and store together
//! - `board` - Stage registry, deal records, the write-through store and filtered views
//! - `config` - Layered configuration (defaults, TOML file, environment)
//! - `error` - Error taxonomy with stable error codes
//! - `session` - Authentication state machine and cached access tokens
//! - `supabase` - HTTP implementation of the collaborators against Supabase
pub mod abstractions;
pub mod app;
pub mod board;
pub mod config;
pub mod error;
pub mod session;
pub mod supabase;

pub use app::Board;
pub use error::{BoardError, BoardResult};
