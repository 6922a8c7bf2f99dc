use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use skuforge_auth::{Credentials, JwtClaims, PrincipalId};
use skuforge_catalog::{CodeComponents, CompositionMode, VocabularySet};
use skuforge_core::DomainError;
use skuforge_infra::{AppConfig, RemoteSkuStore, SkuStore, StoreError};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    async fn spawn_with(extra: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = HashMap::from([("JWT_SECRET".to_string(), JWT_SECRET.to_string())]);
        env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

        // Same router as prod, bound to an ephemeral port.
        let app = skuforge_api::app::build_app(&config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: PrincipalId, lifetime: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + lifetime,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token() -> String {
    mint_jwt(PrincipalId::new(), ChronoDuration::minutes(10))
}

async fn create(client: &reqwest::Client, srv: &TestServer, token: &str, code: &str) -> reqwest::Response {
    client
        .post(srv.url("/api/skus"))
        .bearer_auth(token)
        .json(&json!({ "sku": code }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/api/skus", "/api/stats", "/api/whoami", "/api/vocabulary", "/api/skus/export"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client
        .get(srv.url("/api/skus"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = token();

    let cases = [
        ("/api/skus", "{not json", StatusCode::BAD_REQUEST),
        ("/api/skus", r#"{"sku": 42}"#, StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/skus/import", r#"{"skus": "A-BR-NL"}"#, StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/skus/compose", "", StatusCode::BAD_REQUEST),
        ("/api/auth/login", "{", StatusCode::BAD_REQUEST),
        ("/api/auth/register", r#""ops@shop.test""#, StatusCode::UNPROCESSABLE_ENTITY),
    ];

    for (path, body, expected) in cases {
        let res = client
            .post(srv.url(path))
            .bearer_auth(&token)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected, "{path} {body}");
        let json: serde_json::Value = res.json().await.unwrap();
        assert_eq!(json["error"], "invalid_body", "{path} {body}");
        assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let res = client
        .post(srv.url("/api/skus"))
        .bearer_auth(&token)
        .body(r#"{"sku":"A-BR-NL"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["error"], "invalid_body");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let expired = {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: PrincipalId::new(),
            issued_at: now - ChronoDuration::hours(2),
            expires_at: now - ChronoDuration::hours(1),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap()
    };

    let res = reqwest::Client::new()
        .get(srv.url("/api/skus"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let sub = PrincipalId::new();
    let token = mint_jwt(sub, ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.url("/api/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal_id"].as_str().unwrap(), sub.to_string());
}

#[tokio::test]
async fn register_then_login_issues_a_working_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let creds = json!({ "email": "Ops@Shop.test", "password": "hunter2" });

    let res = client.post(srv.url("/api/auth/register")).json(&creds).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Registered");

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "ops@shop.test", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "no-at-sign", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "ops@shop.test", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "nobody@shop.test", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.post(srv.url("/api/auth/login")).json(&creds).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let res = client.get(srv.url("/api/skus")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn sku_lifecycle_create_duplicate_list_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let sub = PrincipalId::new();
    let token = mint_jwt(sub, ChronoDuration::minutes(10));

    let res = create(&client, &srv, &token, "a-br-nl").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["sku"]["sku"], "A-BR-NL");
    assert_eq!(created["sku"]["issued_by"], sub.to_string());
    let id = created["sku"]["id"].as_str().unwrap().to_string();

    let res = create(&client, &srv, &token, "A-Br-Nl").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_sku");
    assert_eq!(body["message"], "SKU exists: A-BR-NL");

    let res = create(&client, &srv, &token, "   ").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = create(&client, &srv, &token, "sp-au-r").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let list: Vec<serde_json::Value> = client
        .get(srv.url("/api/skus"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["sku"], "SP-AU-R");

    for _ in 0..2 {
        let res = client
            .delete(srv.url(&format!("/api/skus/{id}")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Deleted");
    }

    let res = client
        .delete(srv.url("/api/skus/not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Freed code may be issued again.
    let res = create(&client, &srv, &token, "A-BR-NL").await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn import_and_stats() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = token();

    let res = client
        .post(srv.url("/api/skus/import"))
        .bearer_auth(&token)
        .json(&json!({ "skus": ["SKU", "ll-br-nl", "", "LL-BR-NL", "SP-AU-R"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let summary: serde_json::Value = res.json().await.unwrap();
    assert_eq!(summary, json!({ "imported": 2, "duplicates": 1 }));

    let stats: serde_json::Value = client
        .get(srv.url("/api/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats, json!({ "total": 2, "duplicates": 0, "unique": 2 }));
}

#[tokio::test]
async fn csv_import_and_export() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = token();

    let res = client
        .post(srv.url("/api/skus/import/csv"))
        .bearer_auth(&token)
        .header("content-type", "text/csv")
        .body("SKU,Timestamp\nem-au-pd,2024-01-01T00:00:00Z\n\nEM-AU-PD\nGA-SS-ST\n")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let summary: serde_json::Value = res.json().await.unwrap();
    assert_eq!(summary, json!({ "imported": 2, "duplicates": 1 }));

    let res = client
        .get(srv.url("/api/skus/export"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"SKU_List_"));
    assert!(disposition.ends_with(".csv\""));

    let text = res.text().await.unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("SKU,Timestamp"));
    let codes: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.contains(&"EM-AU-PD"));
    assert!(codes.contains(&"GA-SS-ST"));
}

#[tokio::test]
async fn compose_validates_against_vocabulary() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = token();

    let vocabulary: VocabularySet = client
        .get(srv.url("/api/vocabulary"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(vocabulary, VocabularySet::standard());

    let res = client
        .post(srv.url("/api/skus/compose"))
        .bearer_auth(&token)
        .json(&json!({
            "stone": "A", "metal": "BR", "product": "NL",
            "mode": "corporate", "corporate_client": "HBL", "custom_suffix": "001"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sku"]["sku"], "A-BR-NL-HBL-001");

    let res = client
        .post(srv.url("/api/skus/compose"))
        .bearer_auth(&token)
        .json(&json!({ "stone": "ZZ", "metal": "BR", "product": "NL" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/skus/compose"))
        .bearer_auth(&token)
        .json(&json!({ "metal": "BR", "product": "NL" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/skus/compose"))
        .bearer_auth(&token)
        .json(&json!({ "stone": "A", "metal": "BR", "product": "NL", "mode": "corporate", "corporate_client": "hbl", "custom_suffix": "001" }))
        .send()
        .await
        .unwrap();
    // Unknown client token (vocabulary is case-sensitive).
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sqlite_backed_server_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("api.db").to_string_lossy().to_string();
    let env = [("SKU_STORE", "sqlite"), ("SKU_SQLITE_PATH", db.as_str())];
    let client = reqwest::Client::new();
    let token = token();

    {
        let srv = TestServer::spawn_with(&env).await;
        assert_eq!(create(&client, &srv, &token, "qu-ss-cl").await.status(), StatusCode::CREATED);
    }

    let srv = TestServer::spawn_with(&env).await;
    assert_eq!(create(&client, &srv, &token, "QU-SS-CL").await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn remote_store_speaks_the_api() {
    let srv = TestServer::spawn().await;

    let anonymous = RemoteSkuStore::new(srv.base_url.clone());
    assert!(anonymous.check_connectivity().await);
    let creds = Credentials::new("cli@shop.test", "pw");
    anonymous.register_account(&creds).await.unwrap();
    let err = anonymous.register_account(&creds).await.unwrap_err();
    assert!(matches!(err, StoreError::Auth(skuforge_auth::AuthError::EmailTaken)));
    assert!(anonymous.list().await.is_err());
    let err = anonymous.vocabulary().await.unwrap_err();
    assert!(matches!(err, StoreError::Auth(skuforge_auth::AuthError::InvalidToken(_))));

    let token = anonymous.login(&creds).await.unwrap();
    let store = RemoteSkuStore::with_token(srv.base_url.clone(), token);

    let record = store.register("a-br-nl", None).await.unwrap();
    assert_eq!(record.code(), "A-BR-NL");

    let err = store.register("A-BR-NL", None).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::DuplicateCode(ref c)) if c == "A-BR-NL"));

    let summary = store
        .import_batch(vec!["SKU".into(), "sp-au-r".into(), "a-br-nl".into()], None)
        .await
        .unwrap();
    assert_eq!((summary.imported_count, summary.duplicate_count), (1, 1));

    let composed = store
        .register_components(
            &VocabularySet::standard(),
            &CodeComponents::new("TO", "SL", "B", CompositionMode::Product).with_custom_suffix("9"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(composed.code(), "TO-SL-B-9");

    store.delete(record.id_typed()).await.unwrap();
    store.delete(record.id_typed()).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!((stats.total, stats.duplicates, stats.unique), (2, 0, 2));
    assert_eq!(store.list().await.unwrap().len(), 2);
    assert_eq!(store.vocabulary().await.unwrap(), VocabularySet::standard());
}
