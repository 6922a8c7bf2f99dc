//! The SKU registry: ordered, deduplicated collection of issued records.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use skuforge_core::{
    Clock, DomainError, DomainResult, IdGenerator, PrincipalId, SkuId, SystemClock, UuidV7Generator,
};

use crate::record::{identity_key, SkuRecord};

/// Header cell emitted by CSV exports; never a candidate code on import.
pub const HEADER_TOKEN: &str = "SKU";

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(rename = "imported")]
    pub imported_count: usize,
    #[serde(rename = "duplicates")]
    pub duplicate_count: usize,
}

/// Aggregate counts over the registry.
///
/// `duplicates` counts colliding code identities (groups of records whose
/// codes are equal ignoring case), not surplus records. `unique` is
/// `total - duplicates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub duplicates: usize,
    pub unique: usize,
}

/// Drop CSV artifacts from raw import lines: surrounding whitespace, blank
/// lines, and the exact `SKU` header cell.
pub fn import_candidates<I, S>(raw_codes: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_codes.into_iter().filter_map(|raw| {
        let line = raw.as_ref().trim();
        if line.is_empty() || line == HEADER_TOKEN {
            None
        } else {
            Some(line.to_string())
        }
    })
}

/// Key a candidate code is checked under: its canonical (uppercased) form,
/// case-folded. Equals [`SkuRecord::identity_key`] of the record it would become.
pub fn lookup_key(code: &str) -> String {
    identity_key(&code.to_uppercase())
}

/// Ordered collection of [`SkuRecord`]s with case-insensitive code uniqueness.
///
/// # Invariants
/// - Records created through [`Registry::register`] or [`Registry::import_batch`]
///   never share a code under case-insensitive comparison with any other record.
/// - Insertion order is preserved; deletion is the only removal.
///
/// The registry has no interior locking. Callers sharing one instance must
/// serialize mutations (see the store backends in `skuforge-infra`).
pub struct Registry {
    records: Vec<SkuRecord>,
    /// Case-folded code -> number of records carrying it.
    index: HashMap<String, usize>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidV7Generator))
    }
}

impl Registry {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            clock,
            ids,
        }
    }

    /// Rebuild a registry from previously stored records, in stored order.
    ///
    /// Records are taken as-is; legacy data that already violates uniqueness is
    /// kept (and shows up in [`Registry::compute_stats`]).
    pub fn with_records(
        records: impl IntoIterator<Item = SkuRecord>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let mut registry = Self::new(clock, ids);
        for record in records {
            registry.push(record);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[SkuRecord] {
        &self.records
    }

    pub fn get(&self, id: SkuId) -> Option<&SkuRecord> {
        self.records.iter().find(|r| r.id_typed() == id)
    }

    /// Records ordered most-recent-first (ties: later insertion first).
    pub fn list_recent(&self) -> Vec<SkuRecord> {
        let mut out: Vec<SkuRecord> = self.records.iter().rev().cloned().collect();
        out.sort_by(|a, b| b.issued_at().cmp(&a.issued_at()));
        out
    }

    /// Case-insensitive membership test.
    pub fn contains_code(&self, code: &str) -> bool {
        self.index.contains_key(&identity_key(code))
    }

    /// Issue a single code.
    ///
    /// The code is uppercased before the uniqueness check and for storage.
    /// On failure the registry is unchanged.
    pub fn register(&mut self, code: &str, issued_by: Option<PrincipalId>) -> DomainResult<SkuRecord> {
        if code.trim().is_empty() {
            return Err(DomainError::validation("sku is required"));
        }

        let canonical = code.to_uppercase();
        if self.contains_code(&canonical) {
            return Err(DomainError::duplicate_code(canonical));
        }

        Ok(self.issue(canonical, issued_by))
    }

    /// Ingest many candidate codes, one at a time, in input order.
    ///
    /// Each candidate sees every record accepted earlier in the same batch, so
    /// repeated codes within one batch are counted as duplicates. Never fails.
    pub fn import_batch<I, S>(&mut self, raw_codes: I, issued_by: Option<PrincipalId>) -> ImportSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = ImportSummary::default();

        for candidate in import_candidates(raw_codes) {
            let canonical = candidate.to_uppercase();
            if self.contains_code(&canonical) {
                summary.duplicate_count += 1;
            } else {
                self.issue(canonical, issued_by);
                summary.imported_count += 1;
            }
        }

        summary
    }

    /// Read-only aggregate counts (see [`RegistryStats`]).
    pub fn compute_stats(&self) -> RegistryStats {
        let total = self.records.len();
        let duplicates = self.index.values().filter(|&&n| n > 1).count();
        RegistryStats {
            total,
            duplicates,
            unique: total - duplicates,
        }
    }

    /// Remove the record with `id`. Absent ids are ignored.
    ///
    /// Returns the removed record, if there was one.
    pub fn delete_record(&mut self, id: SkuId) -> Option<SkuRecord> {
        let pos = self.records.iter().position(|r| r.id_typed() == id)?;
        let removed = self.records.remove(pos);

        let key = removed.identity_key();
        if let Some(n) = self.index.get_mut(&key) {
            *n -= 1;
            if *n == 0 {
                self.index.remove(&key);
            }
        }

        Some(removed)
    }

    fn issue(&mut self, canonical: String, issued_by: Option<PrincipalId>) -> SkuRecord {
        let record = SkuRecord::restore(self.ids.next_id(), canonical, self.clock.now(), issued_by);
        self.push(record.clone());
        record
    }

    fn push(&mut self, record: SkuRecord) {
        *self.index.entry(record.identity_key()).or_insert(0) += 1;
        self.records.push(record);
    }
}
