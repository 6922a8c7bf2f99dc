//! SKU storage backends.
//!
//! Every backend holds the uniqueness rule through the catalog `Registry`:
//! the store only decides where records live and how mutations are
//! serialized. Three backends ship:
//!
//! - [`InMemorySkuStore`]: the server default, process-lifetime state.
//! - [`SqliteSkuStore`]: a local SQLite file, used by the server when
//!   persistence is configured and by the CLI in local mode.
//! - [`RemoteSkuStore`]: the HTTP API, used by the CLI in remote mode.

mod in_memory;
mod remote;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use skuforge_auth::AuthError;
use skuforge_catalog::{CodeComponents, ImportSummary, RegistryStats, SkuRecord, VocabularySet};
use skuforge_core::{DomainError, PrincipalId, SkuId};

pub use in_memory::InMemorySkuStore;
pub use remote::RemoteSkuStore;
pub use sqlite::SqliteSkuStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("database error in {operation}: {message}")]
    Database { operation: &'static str, message: String },

    #[error("remote service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode {0}")]
    Decode(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn database(operation: &'static str, err: impl core::fmt::Display) -> Self {
        StoreError::Database {
            operation,
            message: err.to_string(),
        }
    }
}

/// Storage of issued SKUs.
///
/// `register` and `import_batch` are atomic with respect to each other: two
/// concurrent calls never both accept codes that differ only in case.
#[async_trait]
pub trait SkuStore: Send + Sync {
    /// All records, most recent first.
    async fn list(&self) -> Result<Vec<SkuRecord>, StoreError>;

    /// Register one code (upper-cased). Duplicates fail with `DomainError::DuplicateCode`.
    async fn register(&self, code: &str, issued_by: Option<PrincipalId>) -> Result<SkuRecord, StoreError>;

    /// Register many codes, skipping blanks, the `SKU` header and duplicates.
    async fn import_batch(
        &self,
        raw_codes: Vec<String>,
        issued_by: Option<PrincipalId>,
    ) -> Result<ImportSummary, StoreError>;

    /// Remove a record. Deleting an absent id is not an error.
    async fn delete(&self, id: SkuId) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<RegistryStats, StoreError>;

    /// Validate `components` against `vocabulary`, compose, and register.
    async fn register_components(
        &self,
        vocabulary: &VocabularySet,
        components: &CodeComponents,
        issued_by: Option<PrincipalId>,
    ) -> Result<SkuRecord, StoreError> {
        vocabulary.validate(components)?;
        let code = components.compose()?;
        self.register(&code, issued_by).await
    }
}

#[async_trait]
impl<S> SkuStore for Arc<S>
where
    S: SkuStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<SkuRecord>, StoreError> {
        (**self).list().await
    }

    async fn register(&self, code: &str, issued_by: Option<PrincipalId>) -> Result<SkuRecord, StoreError> {
        (**self).register(code, issued_by).await
    }

    async fn import_batch(
        &self,
        raw_codes: Vec<String>,
        issued_by: Option<PrincipalId>,
    ) -> Result<ImportSummary, StoreError> {
        (**self).import_batch(raw_codes, issued_by).await
    }

    async fn delete(&self, id: SkuId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn stats(&self) -> Result<RegistryStats, StoreError> {
        (**self).stats().await
    }

    async fn register_components(
        &self,
        vocabulary: &VocabularySet,
        components: &CodeComponents,
        issued_by: Option<PrincipalId>,
    ) -> Result<SkuRecord, StoreError> {
        (**self).register_components(vocabulary, components, issued_by).await
    }
}
