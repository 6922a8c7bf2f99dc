//! Controlled vocabularies for code segments.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use skuforge_core::{DomainError, DomainResult};

use crate::code::{CodeComponents, CompositionMode};

/// Which vocabulary a segment is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Stone,
    Metal,
    Product,
    CorporateClient,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 4] = [
        SegmentKind::Stone,
        SegmentKind::Metal,
        SegmentKind::Product,
        SegmentKind::CorporateClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Stone => "stone",
            SegmentKind::Metal => "metal",
            SegmentKind::Product => "product",
            SegmentKind::CorporateClient => "corporate_client",
        }
    }
}

impl core::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawVocabulary {
    stones: Vec<String>,
    metals: Vec<String>,
    products: Vec<String>,
    #[serde(default)]
    corporate_clients: Vec<String>,
}

/// Four ordered token lists: stones, metals, products, corporate clients.
///
/// # Invariants
/// - Every token is non-empty and made of `A-Z` / `0-9` only.
/// - Tokens are unique within their own list.
///
/// Configuration, not user data: there is no mutation API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVocabulary")]
pub struct VocabularySet {
    stones: Vec<String>,
    metals: Vec<String>,
    products: Vec<String>,
    corporate_clients: Vec<String>,
}

impl TryFrom<RawVocabulary> for VocabularySet {
    type Error = DomainError;

    fn try_from(raw: RawVocabulary) -> Result<Self, Self::Error> {
        Self::new(raw.stones, raw.metals, raw.products, raw.corporate_clients)
    }
}

impl VocabularySet {
    pub fn new(
        stones: Vec<String>,
        metals: Vec<String>,
        products: Vec<String>,
        corporate_clients: Vec<String>,
    ) -> DomainResult<Self> {
        let set = Self {
            stones,
            metals,
            products,
            corporate_clients,
        };
        for kind in SegmentKind::ALL {
            check_tokens(kind, set.tokens(kind))?;
        }
        Ok(set)
    }

    /// The jewellery catalog vocabulary the registry ships with.
    pub fn standard() -> Self {
        fn owned(tokens: &[&str]) -> Vec<String> {
            tokens.iter().map(|t| (*t).to_string()).collect()
        }

        Self {
            stones: owned(&[
                "LL", "A", "SP", "TO", "AQ", "EM", "AME", "NP", "AJ", "QU", "ID", "GA", "PE", "CT",
            ]),
            metals: owned(&["BR", "SL", "AU", "CU", "SS", "LA"]),
            products: owned(&[
                "NL", "R", "B", "ER", "PD", "BG", "CL", "ST", "PT", "CG", "HD", "FR", "TM", "TH",
            ]),
            corporate_clients: owned(&["HBL", "NUMS", "DW"]),
        }
    }

    /// Parse a vocabulary from JSON (`{"stones":[..],"metals":[..],"products":[..],"corporate_clients":[..]}`).
    pub fn from_json(json: &str) -> DomainResult<Self> {
        serde_json::from_str(json).map_err(|e| DomainError::validation(format!("vocabulary: {e}")))
    }

    pub fn tokens(&self, kind: SegmentKind) -> &[String] {
        match kind {
            SegmentKind::Stone => &self.stones,
            SegmentKind::Metal => &self.metals,
            SegmentKind::Product => &self.products,
            SegmentKind::CorporateClient => &self.corporate_clients,
        }
    }

    pub fn stones(&self) -> &[String] {
        &self.stones
    }

    pub fn metals(&self) -> &[String] {
        &self.metals
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn corporate_clients(&self) -> &[String] {
        &self.corporate_clients
    }

    pub fn contains(&self, kind: SegmentKind, token: &str) -> bool {
        self.tokens(kind).iter().any(|t| t == token)
    }

    /// Check that every vocabulary-backed segment of `components` is known.
    ///
    /// The custom suffix is free-form and never checked. The client token is
    /// only checked in corporate mode, where it contributes a segment.
    pub fn validate(&self, components: &CodeComponents) -> DomainResult<()> {
        let required = [
            (SegmentKind::Stone, components.stone.as_str()),
            (SegmentKind::Metal, components.metal.as_str()),
            (SegmentKind::Product, components.product.as_str()),
        ];
        for (kind, token) in required {
            if token.is_empty() {
                return Err(DomainError::validation(format!("{kind} is required")));
            }
            self.ensure_known(kind, token)?;
        }

        if components.mode == CompositionMode::Corporate {
            if let Some(client) = components.effective_client() {
                self.ensure_known(SegmentKind::CorporateClient, client)?;
            }
        }

        Ok(())
    }

    fn ensure_known(&self, kind: SegmentKind, token: &str) -> DomainResult<()> {
        if self.contains(kind, token) {
            Ok(())
        } else {
            Err(DomainError::validation(format!("unknown {kind} '{token}'")))
        }
    }
}

impl Default for VocabularySet {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_tokens(kind: SegmentKind, tokens: &[String]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(tokens.len());
    for token in tokens {
        if token.is_empty() {
            return Err(DomainError::validation(format!("{kind} vocabulary contains an empty token")));
        }
        if !token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "{kind} token '{token}' must be uppercase letters or digits"
            )));
        }
        if !seen.insert(token.as_str()) {
            return Err(DomainError::validation(format!("{kind} token '{token}' is listed twice")));
        }
    }
    Ok(())
}
