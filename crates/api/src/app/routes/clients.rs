use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_core::ClientId;
use freightdesk_directory::ClientDetails;

use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_client).get(list_clients))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<ClientDetails>,
) -> axum::response::Response {
    match services.store().create_client(details).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_clients().await {
        Ok(clients) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": clients }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id"),
    };

    match services.store().get_client(id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<ClientDetails>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id"),
    };

    match services.store().update_client(id, details).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid client id"),
    };

    match services.store().delete_client(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
