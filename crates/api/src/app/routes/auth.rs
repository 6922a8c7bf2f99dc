use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use skuforge_auth::{AuthError, Credentials, PrincipalId, UserAccount};

use crate::app::{dto, errors, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let credentials = Credentials::new(body.email, body.password);

    // bcrypt is CPU-bound; keep it off the async workers.
    let hashed =
        tokio::task::spawn_blocking(move || UserAccount::register(&credentials, PrincipalId::new(), Utc::now())).await;
    let account = match hashed {
        Ok(Ok(a)) => a,
        Ok(Err(e)) => return errors::auth_error_to_response(e),
        Err(e) => return errors::auth_error_to_response(AuthError::Hashing(e.to_string())),
    };
    let principal_id = account.id();

    if let Err(e) = services.users.insert(account).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(%principal_id, "user registered");
    (StatusCode::CREATED, Json(dto::MessageResponse { message: "Registered" })).into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let account = match services.users.find_by_email(&body.email).await {
        Ok(Some(a)) => a,
        Ok(None) => return errors::auth_error_to_response(AuthError::InvalidCredentials),
        Err(e) => return errors::store_error_to_response(e),
    };

    let password = body.password;
    let checked = tokio::task::spawn_blocking(move || account.authenticate(&password).map(|()| account)).await;
    let account = match checked {
        Ok(Ok(a)) => a,
        Ok(Err(e)) => return errors::auth_error_to_response(e),
        Err(e) => return errors::auth_error_to_response(AuthError::Hashing(e.to_string())),
    };

    match services.tokens.issue(account.id(), Utc::now()) {
        Ok(token) => Json(dto::TokenResponse { token }).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
