//! Error types for the authentication core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Classification of a failed API call.
///
/// Exactly one code is assigned per response class; callers branch on
/// the code without inspecting transport internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No response at all (DNS, connect, timeout)
    NetworkError,
    /// 401 after a failed silent refresh
    AuthExpired,
    /// 401 with no refresh path available
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 422, carries a field-level error map
    ValidationError,
    /// 429 twice in a row
    RateLimited,
    /// 500/502/503/504
    ServerError,
    /// Anything else
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error surfaced by the HTTP gateway.
///
/// Raw transport errors never escape the gateway; every failure is
/// normalized into this shape first.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Field-level validation errors, present for `VALIDATION_ERROR`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// True when the failure means the session itself is unusable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.code, ErrorCode::AuthExpired | ErrorCode::Unauthorized)
    }
}

/// Error type for session orchestration.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Classified API failure from the gateway
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] session_store::StoreError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Operation requires an authenticated session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Operation requires a refresh token
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Credential submission without a challenge correlator
    #[error("No login challenge available")]
    MissingChallenge,
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
