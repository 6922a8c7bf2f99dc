//! Code composition: segments in, canonical code string out.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use skuforge_core::{DomainError, DomainResult, ValueObject};

/// Separator placed between adjacent segments.
pub const SEGMENT_SEPARATOR: &str = "-";

/// Whether a code is issued for the general catalog or for a corporate client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    #[default]
    Product,
    Corporate,
}

impl CompositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::Product => "product",
            CompositionMode::Corporate => "corporate",
        }
    }
}

impl core::fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompositionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(CompositionMode::Product),
            "corporate" => Ok(CompositionMode::Corporate),
            other => Err(DomainError::validation(format!(
                "mode must be one of: product, corporate (got '{other}')"
            ))),
        }
    }
}

/// The selections a composer form hands over.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeComponents {
    pub stone: String,
    pub metal: String,
    pub product: String,
    #[serde(default)]
    pub mode: CompositionMode,
    #[serde(default)]
    pub corporate_client: Option<String>,
    #[serde(default)]
    pub custom_suffix: Option<String>,
}

impl ValueObject for CodeComponents {}

impl CodeComponents {
    pub fn new(
        stone: impl Into<String>,
        metal: impl Into<String>,
        product: impl Into<String>,
        mode: CompositionMode,
    ) -> Self {
        Self {
            stone: stone.into(),
            metal: metal.into(),
            product: product.into(),
            mode,
            corporate_client: None,
            custom_suffix: None,
        }
    }

    pub fn with_corporate_client(mut self, client: impl Into<String>) -> Self {
        self.corporate_client = Some(client.into());
        self
    }

    pub fn with_custom_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.custom_suffix = Some(suffix.into());
        self
    }

    /// Client token that actually contributes a segment (corporate mode only).
    pub fn effective_client(&self) -> Option<&str> {
        match self.mode {
            CompositionMode::Corporate => self.corporate_client.as_deref().filter(|c| !c.is_empty()),
            CompositionMode::Product => None,
        }
    }

    pub fn compose(&self) -> DomainResult<String> {
        compose_code(
            &self.stone,
            &self.metal,
            &self.product,
            self.mode,
            self.corporate_client.as_deref(),
            self.custom_suffix.as_deref(),
        )
    }
}

/// Join the selected segments into a code.
///
/// Order is fixed: stone, metal, product, [client], [suffix]. The client
/// segment is only emitted in corporate mode. No case folding or trimming is
/// applied; callers canonicalize before lookup.
pub fn compose_code(
    stone: &str,
    metal: &str,
    product: &str,
    mode: CompositionMode,
    corporate_client: Option<&str>,
    custom_suffix: Option<&str>,
) -> DomainResult<String> {
    for (field, value) in [("stone", stone), ("metal", metal), ("product", product)] {
        if value.is_empty() {
            return Err(DomainError::validation(format!("{field} is required")));
        }
    }

    let mut segments = vec![stone, metal, product];

    if mode == CompositionMode::Corporate {
        if let Some(client) = corporate_client.filter(|c| !c.is_empty()) {
            segments.push(client);
        }
    }

    if let Some(suffix) = custom_suffix.filter(|s| !s.is_empty()) {
        segments.push(suffix);
    }

    Ok(segments.join(SEGMENT_SEPARATOR))
}
