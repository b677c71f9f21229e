use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use freightdesk_accounting::ExpenseDetails;

use crate::app::errors::domain_error_response;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/", post(record_expense).get(list_expenses))
}

pub async fn record_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(details): Json<ExpenseDetails>,
) -> axum::response::Response {
    match services.record_expense(ctx.actor(), details).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    let Some(scope) = authz::expense_scope(ctx.actor()) else {
        return (StatusCode::OK, Json(serde_json::json!({ "items": [] }))).into_response();
    };

    match services.store().list_expenses(&scope).await {
        Ok(expenses) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": expenses }))).into_response()
        }
        Err(err) => domain_error_response(err),
    }
}
