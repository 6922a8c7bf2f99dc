use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use skuforge_auth::AuthError;
use skuforge_core::DomainError;
use skuforge_infra::StoreError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::DuplicateCode(_) => json_error(StatusCode::CONFLICT, "duplicate_sku", e.to_string()),
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::EmailTaken => json_error(StatusCode::CONFLICT, "email_taken", "email already registered"),
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid email or password")
        }
        e @ (AuthError::InvalidToken(_) | AuthError::Claims(_)) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string())
        }
        AuthError::Issue(msg) => {
            tracing::error!("token issue failed: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "failed to issue token")
        }
        AuthError::Hashing(msg) => {
            tracing::error!("password hashing failed: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "hashing_error", "failed to hash password")
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Auth(e) => auth_error_to_response(e),
        e @ (StoreError::Remote { .. } | StoreError::Network(_)) => {
            tracing::warn!("upstream failure: {e}");
            json_error(StatusCode::BAD_GATEWAY, "upstream_error", e.to_string())
        }
        e @ (StoreError::Database { .. } | StoreError::Decode(_) | StoreError::Poisoned) => {
            tracing::error!("store failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

/// Malformed, mistyped or non-JSON request bodies.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (store_error_to_response(DomainError::validation("x").into()), StatusCode::BAD_REQUEST),
            (store_error_to_response(DomainError::invalid_id("x").into()), StatusCode::BAD_REQUEST),
            (store_error_to_response(DomainError::duplicate_code("A").into()), StatusCode::CONFLICT),
            (store_error_to_response(AuthError::EmailTaken.into()), StatusCode::CONFLICT),
            (store_error_to_response(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED),
            (store_error_to_response(StoreError::Poisoned), StatusCode::INTERNAL_SERVER_ERROR),
            (store_error_to_response(StoreError::Network("down".into())), StatusCode::BAD_GATEWAY),
        ];

        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn every_domain_error_is_a_client_error_with_json_body() {
        let errors = [
            DomainError::validation("stone is required"),
            DomainError::invalid_id("nope"),
            DomainError::duplicate_code("A-BR-NL"),
        ];

        for err in errors {
            let response = domain_error_to_response(err);
            assert!(response.status().is_client_error());
            assert_eq!(
                response.headers()[axum::http::header::CONTENT_TYPE],
                "application/json"
            );
        }
    }
}
