use serde::{Deserialize, Serialize};

use skuforge_catalog::{CodeComponents, CompositionMode, SkuRecord};
use skuforge_core::DomainError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSkuRequest {
    #[serde(default)]
    pub sku: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportSkusRequest {
    #[serde(default)]
    pub skus: Vec<String>,
}

/// Composer form selections. Missing fields surface as validation errors.
#[derive(Debug, Deserialize)]
pub struct ComposeSkuRequest {
    #[serde(default)]
    pub stone: String,
    #[serde(default)]
    pub metal: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub corporate_client: Option<String>,
    #[serde(default)]
    pub custom_suffix: Option<String>,
}

impl TryFrom<ComposeSkuRequest> for CodeComponents {
    type Error = DomainError;

    fn try_from(req: ComposeSkuRequest) -> Result<Self, Self::Error> {
        let mode = match req.mode.as_deref() {
            None | Some("") => CompositionMode::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(CodeComponents {
            stone: req.stone,
            metal: req.metal,
            product: req.product,
            mode,
            corporate_client: req.corporate_client,
            custom_suffix: req.custom_suffix,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SkuEnvelope {
    pub sku: SkuRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
