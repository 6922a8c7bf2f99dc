//! SKU catalog domain module.
//!
//! This crate owns the SKU-construction and registry-integrity rules: composing
//! codes from controlled vocabularies, case-insensitive uniqueness on register
//! and bulk import, and registry statistics. Pure domain logic (no IO, no HTTP,
//! no storage); the CSV codec works on in-memory text only.

pub mod code;
pub mod csv;
pub mod record;
pub mod registry;
pub mod vocabulary;

pub use code::{compose_code, CodeComponents, CompositionMode, SEGMENT_SEPARATOR};
pub use record::SkuRecord;
pub use registry::{import_candidates, lookup_key, ImportSummary, Registry, RegistryStats, HEADER_TOKEN};
pub use vocabulary::{SegmentKind, VocabularySet};
