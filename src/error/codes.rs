/// Error code registry for the deal board
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Session errors
/// - 3000-3999: Remote persistence errors
/// - 4000-4999: Board errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_INVALID_VALUE: u16 = 1001;

    // Session errors (2000-2999)
    pub const SESSION_AUTH_FAILED: u16 = 2001;
    pub const SESSION_NOT_SIGNED_IN: u16 = 2002;
    pub const SESSION_ALREADY_SIGNED_IN: u16 = 2003;

    // Remote persistence errors (3000-3999)
    pub const REMOTE_GENERIC: u16 = 3000;
    pub const REMOTE_TRANSPORT: u16 = 3001;
    pub const REMOTE_STATUS: u16 = 3002;
    pub const REMOTE_SERIALIZATION: u16 = 3003;

    // Board errors (4000-4999)
    pub const BOARD_NOT_LOADED: u16 = 4001;
    pub const BOARD_DEAL_NOT_FOUND: u16 = 4002;
    pub const BOARD_DUPLICATE_DEAL: u16 = 4003;
    pub const BOARD_UNKNOWN_FIELD: u16 = 4004;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",

        ErrorCode::SESSION_AUTH_FAILED => "Authentication failed",
        ErrorCode::SESSION_NOT_SIGNED_IN => "No signed-in session",
        ErrorCode::SESSION_ALREADY_SIGNED_IN => "A session is already signed in",

        ErrorCode::REMOTE_GENERIC => "Remote persistence error",
        ErrorCode::REMOTE_TRANSPORT => "Remote service unreachable",
        ErrorCode::REMOTE_STATUS => "Remote service rejected the request",
        ErrorCode::REMOTE_SERIALIZATION => "Remote payload could not be (de)serialized",

        ErrorCode::BOARD_NOT_LOADED => "Board has not been loaded",
        ErrorCode::BOARD_DEAL_NOT_FOUND => "Deal not found on the board",
        ErrorCode::BOARD_DUPLICATE_DEAL => "Deal id already present on the board",
        ErrorCode::BOARD_UNKNOWN_FIELD => "Unknown deal field",

        _ => "Unknown error",
    }
}
