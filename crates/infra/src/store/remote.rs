//! HTTP client for the registry API.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use skuforge_auth::{AuthError, Credentials};
use skuforge_catalog::{CodeComponents, ImportSummary, RegistryStats, SkuRecord, VocabularySet};
use skuforge_core::{DomainError, PrincipalId, SkuId};

use super::{SkuStore, StoreError};

/// Prefix of the server's duplicate-code message.
const DUPLICATE_PREFIX: &str = "SKU exists: ";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    sku: SkuRecord,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: String,
}

/// [`SkuStore`] backed by a running API server.
///
/// The server enforces uniqueness; this client only maps its error bodies
/// back onto the same error variants the local stores return. The issuer
/// argument is ignored: the server attributes records to the bearer token.
#[derive(Debug, Clone)]
pub struct RemoteSkuStore {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RemoteSkuStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(self.http.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }

    /// Create an account on the server.
    pub async fn register_account(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(self.url("/api/auth/register"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        check(resp).await.map(drop)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, StoreError> {
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let envelope: TokenEnvelope = decode(resp, "login response").await?;
        Ok(envelope.token)
    }

    /// The server's vocabulary. The endpoint is protected, so this needs a token.
    pub async fn vocabulary(&self) -> Result<VocabularySet, StoreError> {
        let resp = self.get("/api/vocabulary").await?;
        decode(resp, "vocabulary").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, StoreError> {
        self.authorized(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, StoreError> {
        self.authorized(self.http.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))
    }
}

/// Map a non-success response onto a [`StoreError`].
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or(ErrorBody {
        error: String::new(),
        message: text,
    });

    Err(error_from_body(status.as_u16(), body))
}

fn error_from_body(status: u16, body: ErrorBody) -> StoreError {
    match (status, body.error.as_str()) {
        (400, "invalid_id") => DomainError::InvalidId(body.message).into(),
        (400, _) => DomainError::Validation(body.message).into(),
        (409, "email_taken") => AuthError::EmailTaken.into(),
        (409, _) => {
            let code = body.message.strip_prefix(DUPLICATE_PREFIX).unwrap_or(&body.message);
            DomainError::duplicate_code(code).into()
        }
        (401, "invalid_credentials") => AuthError::InvalidCredentials.into(),
        (401, _) => AuthError::InvalidToken(body.message).into(),
        _ => StoreError::Remote {
            status,
            message: body.message,
        },
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T, StoreError> {
    let resp = check(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| StoreError::Decode(format!("{what}: {e}")))
}

#[async_trait]
impl SkuStore for RemoteSkuStore {
    async fn list(&self) -> Result<Vec<SkuRecord>, StoreError> {
        let resp = self.get("/api/skus").await?;
        decode(resp, "sku list").await
    }

    async fn register(&self, code: &str, _issued_by: Option<PrincipalId>) -> Result<SkuRecord, StoreError> {
        let resp = self.post("/api/skus", &json!({ "sku": code })).await?;
        let envelope: RecordEnvelope = decode(resp, "registered sku").await?;
        Ok(envelope.sku)
    }

    async fn import_batch(
        &self,
        raw_codes: Vec<String>,
        _issued_by: Option<PrincipalId>,
    ) -> Result<ImportSummary, StoreError> {
        let resp = self.post("/api/skus/import", &json!({ "skus": raw_codes })).await?;
        decode(resp, "import summary").await
    }

    async fn delete(&self, id: SkuId) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.http.delete(self.url(&format!("/api/skus/{id}"))))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        check(resp).await.map(drop)
    }

    async fn stats(&self) -> Result<RegistryStats, StoreError> {
        let resp = self.get("/api/stats").await?;
        decode(resp, "stats").await
    }

    /// Composition is validated by the server against its own vocabulary.
    async fn register_components(
        &self,
        _vocabulary: &VocabularySet,
        components: &CodeComponents,
        _issued_by: Option<PrincipalId>,
    ) -> Result<SkuRecord, StoreError> {
        let resp = self.post("/api/skus/compose", components).await?;
        let envelope: RecordEnvelope = decode(resp, "composed sku").await?;
        Ok(envelope.sku)
    }
}
