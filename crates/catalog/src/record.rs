use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skuforge_core::{Entity, PrincipalId, SkuId};

/// An issued SKU.
///
/// Records are immutable once created; the only lifecycle transition is
/// deletion from the registry. The serialized field names (`sku`, `timestamp`)
/// are the wire shape shared by the HTTP API and its clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    id: SkuId,
    #[serde(rename = "sku")]
    code: String,
    #[serde(rename = "timestamp")]
    issued_at: DateTime<Utc>,
    #[serde(default)]
    issued_by: Option<PrincipalId>,
}

impl SkuRecord {
    /// Rehydrate a record from storage.
    ///
    /// No normalization happens here: stored codes are taken as they are.
    pub fn restore(
        id: SkuId,
        code: impl Into<String>,
        issued_at: DateTime<Utc>,
        issued_by: Option<PrincipalId>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            issued_at,
            issued_by,
        }
    }

    pub fn id_typed(&self) -> SkuId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn issued_by(&self) -> Option<PrincipalId> {
        self.issued_by
    }

    /// Case-folded identity of the code; two records with equal keys are the same SKU.
    pub fn identity_key(&self) -> String {
        identity_key(&self.code)
    }
}

impl Entity for SkuRecord {
    type Id = SkuId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub(crate) fn identity_key(code: &str) -> String {
    code.to_lowercase()
}
