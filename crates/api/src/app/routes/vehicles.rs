use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_core::VehicleId;
use freightdesk_fleet::VehicleDetails;

use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_vehicle).get(list_vehicles))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}

pub async fn create_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<VehicleDetails>,
) -> axum::response::Response {
    match services.store().create_vehicle(details).await {
        Ok(vehicle) => (StatusCode::CREATED, Json(vehicle)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_vehicles(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_vehicles().await {
        Ok(vehicles) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": vehicles }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: VehicleId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vehicle id"),
    };

    match services.store().get_vehicle(id).await {
        Ok(vehicle) => (StatusCode::OK, Json(vehicle)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<VehicleDetails>,
) -> axum::response::Response {
    let id: VehicleId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vehicle id"),
    };

    match services.store().update_vehicle(id, details).await {
        Ok(vehicle) => (StatusCode::OK, Json(vehicle)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: VehicleId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vehicle id"),
    };

    match services.store().delete_vehicle(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
