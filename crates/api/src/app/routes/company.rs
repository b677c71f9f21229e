use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use freightdesk_accounting::CompanyInfoUpdate;

use crate::app::errors::domain_error_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", get(get_company_info).post(update_company_info))
}

pub async fn get_company_info(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().company_info().await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_company_info(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(update): Json<CompanyInfoUpdate>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin_tier(ctx.actor()) {
        return resp;
    }

    match services.store().update_company_info(update).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(err) => domain_error_response(err),
    }
}
