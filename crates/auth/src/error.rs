use thiserror::Error;

use crate::claims::TokenValidationError;

/// Failures of the access capability check and of account management.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The bearer token could not be decoded or its signature is wrong.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token decoded fine but its time window rejects it.
    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    /// Unknown email or wrong password (deliberately not distinguished).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to issue token: {0}")]
    Issue(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
