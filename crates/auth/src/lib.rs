//! `skuforge-auth` — access capability check (zero-trust boundary).
//!
//! Token format and expiry are treated as an opaque capability: the registry
//! never looks inside. This crate is decoupled from HTTP and storage.

pub mod account;
pub mod claims;
pub mod credentials;
pub mod error;
pub mod token;

pub use account::UserAccount;
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use credentials::{Credentials, PasswordHash};
pub use error::AuthError;
pub use skuforge_core::PrincipalId;
pub use token::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, TokenIssuer};
