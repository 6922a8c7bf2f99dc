//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two SKU codes
/// with the same text are the same code, whichever record carries them.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Segment(String);
///
/// impl ValueObject for Segment {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
