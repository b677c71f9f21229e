use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::Utc;

use crate::app::errors::domain_error_response;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/stats", get(stats))
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().dashboard_stats(Utc::now()).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => domain_error_response(err),
    }
}
