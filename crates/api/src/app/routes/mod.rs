use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod auth;
pub mod skus;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/whoami", get(system::whoami))
        .route("/api/stats", get(system::stats))
        .route("/api/vocabulary", get(system::vocabulary))
        .route("/api/skus", get(skus::list_skus).post(skus::create_sku))
        .route("/api/skus/compose", post(skus::compose_sku))
        .route("/api/skus/import", post(skus::import_skus))
        .route("/api/skus/import/csv", post(skus::import_csv))
        .route("/api/skus/export", get(skus::export_csv))
        .route("/api/skus/:id", delete(skus::delete_sku))
}
