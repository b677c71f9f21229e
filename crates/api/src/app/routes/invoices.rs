use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_core::InvoiceId;
use freightdesk_infra::NewInvoice;

use crate::app::dto;
use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(issue_invoice).get(list_invoices))
        .route("/:id", get(get_invoice).patch(update_invoice))
}

pub async fn issue_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<NewInvoice>,
) -> axum::response::Response {
    let actor = ctx.actor();
    if actor.office_id.is_none() {
        return json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "user has no origin office",
        );
    }

    match services.issue_invoice(actor, body).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    let scope = authz::invoice_scope(ctx.actor());
    match services.store().list_invoices(&scope).await {
        Ok(invoices) => (
            StatusCode::OK,
            Json(serde_json::json!({ "items": invoices })),
        )
            .into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    let scope = authz::invoice_scope(ctx.actor());
    match services.store().get_invoice(id, &scope).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateInvoiceRequest>,
) -> axum::response::Response {
    let id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    let scope = authz::invoice_scope(ctx.actor());
    match services
        .store()
        .set_invoice_payment_status(id, body.payment_status, &scope)
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(err) => domain_error_response(err),
    }
}
