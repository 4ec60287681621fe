//! Crate-wide error types.
//!
//! Mirrors the three error strata of the request pipeline: protocol-level
//! errors (malformed params), categorized tool-level errors (auth/session
//! gate failures returned as successful protocol responses), and opaque
//! passthrough errors from the underlying tool handler.

use std::fmt;

/// JSON-RPC-style error code.
///
/// A thin newtype over `i32` so call sites read `ErrorCode::INVALID_PARAMS`
/// rather than a bare magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// Standard JSON-RPC "invalid params" code.
    pub const INVALID_PARAMS: ErrorCode = ErrorCode(-32602);
    /// Standard JSON-RPC "internal error" code.
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(-32603);
    /// Standard JSON-RPC "method not found" code.
    pub const METHOD_NOT_FOUND: ErrorCode = ErrorCode(-32601);

    /// The raw numeric value.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a tool-level error, carried through the result envelope so
/// the audit layer can classify failures without re-parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The authenticator rejected or could not validate the caller.
    AuthenticationFailed,
    /// The policy engine denied the tool for this caller.
    AuthorizationDenied,
    /// The caller declined a prompt the tool required (e.g. elicitation).
    UserDeclined,
    /// A precondition the caller must satisfy first (e.g. the session gate).
    SetupRequired,
}

impl ErrorCategory {
    /// The wire representation used in the audit event's `error_category` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::AuthenticationFailed => "authentication_failed",
            ErrorCategory::AuthorizationDenied => "authorization_denied",
            ErrorCategory::UserDeclined => "user_declined",
            ErrorCategory::SetupRequired => "setup_required",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized error produced by the authentication, authorization, or
/// session-gate layers. Travels through the result envelope as a
/// successful protocol response whose body the caller can introspect via
/// [`Error::category`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{category}: {message}")]
pub struct PlatformError {
    /// Failure category, used by the audit layer.
    pub category: ErrorCategory,
    /// Human-readable message, shown to the caller.
    pub message: String,
}

impl PlatformError {
    /// Construct a new categorized error.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed or mismatched protocol request. `next` is never invoked
    /// for these; they never reach the tool handler.
    #[error("protocol error {code}: {message}")]
    Protocol {
        /// JSON-RPC error code.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
    },

    /// A categorized tool-level error (§7 stratum 2).
    #[error(transparent)]
    Categorized(#[from] PlatformError),

    /// An opaque error from a collaborator (tool handler, catalog
    /// provider, audit sink) passed through unchanged (§7 stratum 3).
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Construct a protocol-level error.
    pub fn protocol(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Construct an internal/passthrough error from any displayable cause.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Construct a categorized setup-required error, the session gate's
    /// sole failure mode.
    pub fn setup_required(message: impl Into<String>) -> Self {
        Error::Categorized(PlatformError::new(ErrorCategory::SetupRequired, message))
    }

    /// Construct a categorized authentication-failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Error::Categorized(PlatformError::new(
            ErrorCategory::AuthenticationFailed,
            message,
        ))
    }

    /// Construct a categorized authorization-denied error.
    pub fn authorization_denied(message: impl Into<String>) -> Self {
        Error::Categorized(PlatformError::new(
            ErrorCategory::AuthorizationDenied,
            message,
        ))
    }

    /// The error's category, if this is a categorized tool-level error.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Categorized(e) => Some(e.category),
            _ => None,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
