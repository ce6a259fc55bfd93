use serde::Serialize;
use thiserror::Error;

use crate::auth::AccessError;

/// Failure taxonomy exposed by the workflow. Every storage or token failure
/// is folded into exactly one of these before it leaves the crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    Validation,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Unauthorized(_) => 1001,
            ServiceError::Forbidden(_) => 1002,
            ServiceError::Validation(_) => 1003,
            ServiceError::Conflict(_) => 1004,
            ServiceError::Internal(_) => 1200,
        }
    }

    /// Human-readable part without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Unauthorized(m)
            | ServiceError::Forbidden(m)
            | ServiceError::Validation(m)
            | ServiceError::Conflict(m)
            | ServiceError::Internal(m) => m,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }
}

impl From<AccessError> for ServiceError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthorized(m) => ServiceError::Unauthorized(m),
            AccessError::Forbidden => ServiceError::Forbidden("access denied".into()),
        }
    }
}
