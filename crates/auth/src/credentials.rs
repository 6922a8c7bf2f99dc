//! Login credentials and bcrypt password hashes.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// bcrypt work factor for newly hashed passwords.
pub const HASH_COST: u32 = 10;

/// Email + password pair as submitted by a client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Lookup key for the account: trimmed, lower-cased email.
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AuthError::validation("email is required"));
        }
        if !email.contains('@') {
            return Err(AuthError::validation("email must contain '@'"));
        }
        if self.password.is_empty() {
            return Err(AuthError::validation("password is required"));
        }
        Ok(())
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A bcrypt hash in its modular-crypt encoding (`$2b$<cost>$<salt+digest>`).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash with a fresh random salt at [`HASH_COST`].
    pub fn generate(password: &str) -> Result<Self, AuthError> {
        Self::with_cost(password, HASH_COST)
    }

    pub fn with_cost(password: &str, cost: u32) -> Result<Self, AuthError> {
        bcrypt::hash(password, cost)
            .map(Self)
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    pub fn verify(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.0) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("password verification failed: {e}");
                false
            }
        }
    }

    pub fn cost(&self) -> Option<u32> {
        self.0.parse::<bcrypt::HashParts>().ok().map(|parts| parts.get_cost())
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHash").field("cost", &self.cost()).finish_non_exhaustive()
    }
}

impl core::fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PasswordHash {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<bcrypt::HashParts>()
            .map_err(|e| AuthError::validation(format!("malformed password hash: {e}")))?;
        Ok(Self(s.to_string()))
    }
}
