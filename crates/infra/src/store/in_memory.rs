use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use skuforge_catalog::{ImportSummary, Registry, RegistryStats, SkuRecord};
use skuforge_core::{Clock, IdGenerator, PrincipalId, SkuId};

use super::{SkuStore, StoreError};

/// Process-lifetime store for the API server and tests.
///
/// Mutations hold the write guard for the whole check-then-insert, which is
/// what keeps concurrent registrations of the same code from both succeeding.
#[derive(Debug, Default)]
pub struct InMemorySkuStore {
    inner: RwLock<Registry>,
}

impl InMemorySkuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with explicit time and id sources.
    pub fn with_collaborators(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: RwLock::new(Registry::new(clock, ids)),
        }
    }

    /// Store seeded with existing records (kept as-is, legacy duplicates included).
    pub fn with_records(
        records: impl IntoIterator<Item = SkuRecord>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            inner: RwLock::new(Registry::with_records(records, clock, ids)),
        }
    }
}

#[async_trait]
impl SkuStore for InMemorySkuStore {
    async fn list(&self) -> Result<Vec<SkuRecord>, StoreError> {
        let registry = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(registry.list_recent())
    }

    #[tracing::instrument(skip(self))]
    async fn register(&self, code: &str, issued_by: Option<PrincipalId>) -> Result<SkuRecord, StoreError> {
        let mut registry = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let record = registry.register(code, issued_by)?;
        tracing::info!(sku_id = %record.id_typed(), code = record.code(), "sku registered");
        Ok(record)
    }

    #[tracing::instrument(skip(self, raw_codes), fields(candidates = raw_codes.len()))]
    async fn import_batch(
        &self,
        raw_codes: Vec<String>,
        issued_by: Option<PrincipalId>,
    ) -> Result<ImportSummary, StoreError> {
        let mut registry = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let summary = registry.import_batch(raw_codes, issued_by);
        tracing::info!(
            imported = summary.imported_count,
            duplicates = summary.duplicate_count,
            "sku import applied"
        );
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: SkuId) -> Result<(), StoreError> {
        let mut registry = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if registry.delete_record(id).is_some() {
            tracing::info!(sku_id = %id, "sku deleted");
        } else {
            tracing::debug!(sku_id = %id, "delete of unknown sku ignored");
        }
        Ok(())
    }

    async fn stats(&self) -> Result<RegistryStats, StoreError> {
        let registry = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(registry.compute_stats())
    }
}
