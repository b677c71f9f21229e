use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_core::OfficeId;
use freightdesk_directory::OfficeDetails;

use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_office).get(list_offices))
        .route(
            "/:id",
            get(get_office).put(update_office).delete(delete_office),
        )
}

pub async fn create_office(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<OfficeDetails>,
) -> axum::response::Response {
    match services.store().create_office(details).await {
        Ok(office) => (StatusCode::CREATED, Json(office)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_offices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_offices().await {
        Ok(offices) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": offices }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_office(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OfficeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid office id"),
    };

    match services.store().get_office(id).await {
        Ok(office) => (StatusCode::OK, Json(office)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_office(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<OfficeDetails>,
) -> axum::response::Response {
    let id: OfficeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid office id"),
    };

    match services.store().update_office(id, details).await {
        Ok(office) => (StatusCode::OK, Json(office)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_office(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OfficeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid office id"),
    };

    match services.store().delete_office(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
