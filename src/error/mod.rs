//! Error taxonomy for the deal board
//!
//! Remote collaborators report failures as [`RemoteError`] and [`AuthError`]
//! values. Every board operation folds those into [`BoardError`], which
//! carries a stable numeric code for display.

use crate::board::DealId;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Result type for remote persistence calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Failure reported by the remote persistence service
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A request or response body could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic error wrapper
    #[error("remote error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RemoteError {
    /// Create a transport error
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create a status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<E: std::fmt::Display>(err: E) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Stable error code for this failure
    pub fn code(&self) -> u16 {
        match self {
            Self::Transport(_) => ErrorCode::REMOTE_TRANSPORT,
            Self::Status { .. } => ErrorCode::REMOTE_STATUS,
            Self::Serialization(_) => ErrorCode::REMOTE_SERIALIZATION,
            Self::Other(_) => ErrorCode::REMOTE_GENERIC,
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

/// Credentials were rejected by the identity provider.
///
/// The message is whatever the provider said; it is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The error type returned by every board and session operation
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("[E{code:04}] Authentication failed: {0}", code = ErrorCode::SESSION_AUTH_FAILED)]
    Auth(#[from] AuthError),

    #[error("[E{code:04}] Not signed in", code = ErrorCode::SESSION_NOT_SIGNED_IN)]
    NotSignedIn,

    #[error("[E{code:04}] Already signed in as {0}", code = ErrorCode::SESSION_ALREADY_SIGNED_IN)]
    AlreadySignedIn(String),

    #[error("[E{code:04}] Board has not been loaded", code = ErrorCode::BOARD_NOT_LOADED)]
    NotLoaded,

    #[error("[E{code:04}] Deal not found: {0}", code = ErrorCode::BOARD_DEAL_NOT_FOUND)]
    DealNotFound(DealId),

    #[error("[E{code:04}] Deal {0} is already on the board", code = ErrorCode::BOARD_DUPLICATE_DEAL)]
    DuplicateDeal(DealId),

    #[error("[E{code:04}] Unknown deal field: {0}", code = ErrorCode::BOARD_UNKNOWN_FIELD)]
    UnknownField(String),

    #[error("[E{code:04}] Configuration error: {0}", code = ErrorCode::CONFIG_INVALID_VALUE)]
    Config(String),

    #[error("[E{code:04}] {0}", code = .0.code())]
    Remote(#[from] RemoteError),
}

impl BoardError {
    /// Stable error code for this error
    pub fn code(&self) -> u16 {
        match self {
            Self::Auth(_) => ErrorCode::SESSION_AUTH_FAILED,
            Self::NotSignedIn => ErrorCode::SESSION_NOT_SIGNED_IN,
            Self::AlreadySignedIn(_) => ErrorCode::SESSION_ALREADY_SIGNED_IN,
            Self::NotLoaded => ErrorCode::BOARD_NOT_LOADED,
            Self::DealNotFound(_) => ErrorCode::BOARD_DEAL_NOT_FOUND,
            Self::DuplicateDeal(_) => ErrorCode::BOARD_DUPLICATE_DEAL,
            Self::UnknownField(_) => ErrorCode::BOARD_UNKNOWN_FIELD,
            Self::Config(_) => ErrorCode::CONFIG_INVALID_VALUE,
            Self::Remote(err) => err.code(),
        }
    }

    /// Whether this error came from the remote service rather than local state
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
