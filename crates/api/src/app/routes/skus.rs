use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use skuforge_catalog::{csv, CodeComponents};
use skuforge_core::SkuId;

use crate::app::{dto, errors, AppServices};
use crate::context::PrincipalContext;

pub async fn list_skus(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.skus.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateSkuRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.skus.register(&body.sku, Some(principal.principal_id())).await {
        Ok(sku) => (StatusCode::CREATED, Json(dto::SkuEnvelope { sku })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn compose_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ComposeSkuRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let components = match CodeComponents::try_from(body) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .skus
        .register_components(&services.vocabulary, &components, Some(principal.principal_id()))
        .await
    {
        Ok(sku) => (StatusCode::CREATED, Json(dto::SkuEnvelope { sku })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SkuId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.skus.delete(id).await {
        Ok(()) => Json(dto::MessageResponse { message: "Deleted" }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn import_skus(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ImportSkusRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.skus.import_batch(body.skus, Some(principal.principal_id())).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Raw CSV upload: first column of every row is a candidate code.
pub async fn import_csv(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: String,
) -> axum::response::Response {
    let codes = match csv::parse_import(&body) {
        Ok(c) => c,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_csv", e.to_string()),
    };

    match services.skus.import_batch(codes, Some(principal.principal_id())).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn export_csv(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let records = match services.skus.list().await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    let text = match csv::write_export(&records) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("csv export failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "export_error", e.to_string());
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv::export_file_name(Utc::now().date_naive())
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    )
        .into_response()
}
