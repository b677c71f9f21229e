use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};

use crate::app::errors::domain_error_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_audit_logs))
}

pub async fn list_audit_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin_tier(ctx.actor()) {
        return resp;
    }

    match services.store().list_audit_logs().await {
        Ok(records) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": records }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}
