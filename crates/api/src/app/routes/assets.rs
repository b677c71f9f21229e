use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_accounting::AssetDetails;
use freightdesk_core::{AssetId, RefId};

use crate::app::dto;
use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_asset).get(list_assets))
        .route(
            "/:id",
            get(get_asset).put(update_asset).delete(delete_asset),
        )
}

/// Mounted separately at `/asset-categories`.
pub fn categories_router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

pub async fn create_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<AssetDetails>,
) -> axum::response::Response {
    match services.store().create_asset(details).await {
        Ok(asset) => (StatusCode::CREATED, Json(asset)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_assets(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_assets().await {
        Ok(assets) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": assets }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssetId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid asset id"),
    };

    match services.store().get_asset(id).await {
        Ok(asset) => (StatusCode::OK, Json(asset)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<AssetDetails>,
) -> axum::response::Response {
    let id: AssetId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid asset id"),
    };

    match services.store().update_asset(id, details).await {
        Ok(asset) => (StatusCode::OK, Json(asset)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssetId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid asset id"),
    };

    match services.store().delete_asset(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.store().create_asset_category(body.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_asset_categories().await {
        Ok(categories) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": categories })),
        )
            .into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RefId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.store().get_asset_category(id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    let id: RefId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.store().update_asset_category(id, body.name).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RefId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.store().delete_asset_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
