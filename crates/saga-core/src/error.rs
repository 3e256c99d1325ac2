//! Shared error type across SAGA crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// No session, or the session token is unknown.
    Unauthenticated,
    /// Session present but the action is denied.
    Forbidden,
    /// Target resource does not exist.
    NotFound,
    /// Target already exists.
    Conflict,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Unauthenticated => "UNAUTHENTICATED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SagaError>;

/// Unified error type used by core and server.
///
/// `Unauthenticated`, `Forbidden` and `NotFound` are distinct outcomes and
/// must never be folded into one another.
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SagaError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SagaError::BadRequest(_) => ClientCode::BadRequest,
            SagaError::Unauthenticated => ClientCode::Unauthenticated,
            SagaError::Forbidden(_) => ClientCode::Forbidden,
            SagaError::NotFound(_) => ClientCode::NotFound,
            SagaError::Conflict(_) => ClientCode::Conflict,
            SagaError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SagaError::Internal(_) => ClientCode::Internal,
        }
    }
}
