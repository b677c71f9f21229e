use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_core::ManifestId;
use freightdesk_fleet::ManifestDetails;

use crate::app::dto;
use crate::app::errors::{dispatch_error_response, domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_manifest).get(list_manifests))
        .route("/:id", get(get_manifest))
        .route("/:id/dispatch", post(dispatch_manifest))
        .route("/:id/finalize_trip", post(finalize_trip))
}

pub async fn create_manifest(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<ManifestDetails>,
) -> axum::response::Response {
    match services.store().create_manifest(details).await {
        Ok(manifest) => (StatusCode::CREATED, Json(manifest)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_manifests(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_manifests().await {
        Ok(manifests) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": manifests })),
        )
            .into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_manifest(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ManifestId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid manifest id"),
    };

    match services.store().get_manifest(id).await {
        Ok((manifest, invoices)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "manifest": manifest, "invoices": invoices })),
        )
            .into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn dispatch_manifest(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DispatchRequest>,
) -> axum::response::Response {
    let id: ManifestId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid manifest id"),
    };

    match services
        .store()
        .dispatch_manifest(id, &body.invoice_ids, body.driver_id)
        .await
    {
        Ok(_manifest) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "manifest dispatched" })),
        )
            .into_response(),
        Err(err) => dispatch_error_response(err),
    }
}

pub async fn finalize_trip(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ManifestId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid manifest id"),
    };

    match services.store().finalize_trip(id).await {
        Ok(_manifest) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "trip finalized, invoices delivered" })),
        )
            .into_response(),
        Err(err) => dispatch_error_response(err),
    }
}
