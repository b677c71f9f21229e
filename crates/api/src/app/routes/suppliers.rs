use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_accounting::SupplierDetails;
use freightdesk_core::SupplierId;

use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/:id",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<SupplierDetails>,
) -> axum::response::Response {
    match services.store().create_supplier(details).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_suppliers().await {
        Ok(suppliers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": suppliers })),
        )
            .into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };

    match services.store().get_supplier(id).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<SupplierDetails>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };

    match services.store().update_supplier(id, details).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };

    match services.store().delete_supplier(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
