//! Registered identities.

use chrono::{DateTime, Utc};

use skuforge_core::PrincipalId;

use crate::credentials::{normalize_email, Credentials, PasswordHash};
use crate::error::AuthError;

/// A registered user who may obtain bearer tokens.
///
/// # Invariants
/// - `email` is stored normalized (trimmed, lower-cased).
/// - The plain password is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    id: PrincipalId,
    email: String,
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create an account from submitted credentials.
    pub fn register(credentials: &Credentials, id: PrincipalId, now: DateTime<Utc>) -> Result<Self, AuthError> {
        credentials.validate()?;
        Ok(Self {
            id,
            email: credentials.normalized_email(),
            password_hash: PasswordHash::generate(&credentials.password)?,
            created_at: now,
        })
    }

    /// Rehydrate from storage.
    pub fn restore(id: PrincipalId, email: &str, password_hash: PasswordHash, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email: normalize_email(email),
            password_hash,
            created_at,
        }
    }

    pub fn id(&self) -> PrincipalId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn authenticate(&self, password: &str) -> Result<(), AuthError> {
        if self.password_hash.verify(password) {
            Ok(())
        } else {
            tracing::debug!(principal_id = %self.id, "password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }
}
