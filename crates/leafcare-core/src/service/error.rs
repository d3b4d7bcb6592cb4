//! Service error handling
//!
//! Every failure of a resource operation is one of a small set of outcomes,
//! each carrying the HTTP-style status code a front end should report.

use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::storage::StoreError;

/// Message shown for any internal failure
pub const INTERNAL_MESSAGE: &str = "Server error. Check logs for more details";

/// Result type for service operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Outcome of a failed resource operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or invalid input
    #[error("{0}")]
    BadRequest(String),

    /// No usable token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Resource does not exist (or is hidden from the caller)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness rule violated
    #[error("{0}")]
    Conflict(String),

    /// Storage or signing failure; details are logged, not returned
    #[error("Server error. Check logs for more details")]
    Internal,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    /// HTTP status code for this outcome
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal => 500,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "store operation failed");
        ApiError::Internal
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::Unauthorized(AuthError::InvalidToken.to_string())
            }
            AuthError::TokenGenerationFailed | AuthError::PasswordHash(_) => {
                error!(error = %err, "auth operation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        error!(error = %err, "stored document does not match its record type");
        ApiError::Internal
    }
}
