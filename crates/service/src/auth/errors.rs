use thiserror::Error;

/// Why a token could not be issued or accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    Tampered,
    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Outcome of a failed role check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("access denied")]
    Forbidden,
}

impl From<TokenError> for AccessError {
    fn from(e: TokenError) -> Self {
        AccessError::Unauthorized(e.to_string())
    }
}

/// Hashing failures from argon2.
#[derive(Debug, Error)]
#[error("hashing error: {0}")]
pub struct HashError(pub String);
