//! Reference data kept under `/settings`: shipping types, payment
//! methods, merchandise categories, and expense categories.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use freightdesk_billing::PaymentMethodDetails;
use freightdesk_core::RefId;

use crate::app::dto;
use crate::app::errors::{domain_error_response, json_error};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .nest("/shipping-types", shipping_types_router())
        .nest("/payment-methods", payment_methods_router())
        .nest("/categories", categories_router())
        .nest("/expense-categories", expense_categories_router())
}

fn shipping_types_router() -> Router {
    Router::new()
        .route("/", post(create_shipping_type).get(list_shipping_types))
        .route(
            "/:id",
            get(get_shipping_type)
                .put(update_shipping_type)
                .delete(delete_shipping_type),
        )
}

fn payment_methods_router() -> Router {
    Router::new()
        .route("/", post(create_payment_method).get(list_payment_methods))
        .route(
            "/:id",
            get(get_payment_method)
                .put(update_payment_method)
                .delete(delete_payment_method),
        )
}

fn categories_router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

fn expense_categories_router() -> Router {
    Router::new()
        .route(
            "/",
            post(create_expense_category).get(list_expense_categories),
        )
        .route(
            "/:id",
            get(get_expense_category)
                .put(update_expense_category)
                .delete(delete_expense_category),
        )
}

fn parse_ref_id(raw: &str) -> Result<RefId, axum::response::Response> {
    raw.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "invalid reference id",
        )
    })
}

pub async fn create_shipping_type(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.store().create_shipping_type(body.name).await {
        Ok(shipping_type) => (StatusCode::CREATED, Json(shipping_type)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_shipping_types(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_shipping_types().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_shipping_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().get_shipping_type(id).await {
        Ok(shipping_type) => (StatusCode::OK, Json(shipping_type)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_shipping_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().update_shipping_type(id, body.name).await {
        Ok(shipping_type) => (StatusCode::OK, Json(shipping_type)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_shipping_type(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().delete_shipping_type(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn create_payment_method(
    Extension(services): Extension<Arc<AppServices>>,
    Json(details): Json<PaymentMethodDetails>,
) -> axum::response::Response {
    match services.store().create_payment_method(details).await {
        Ok(method) => (StatusCode::CREATED, Json(method)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_payment_methods(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_payment_methods().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_payment_method(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().get_payment_method(id).await {
        Ok(method) => (StatusCode::OK, Json(method)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_payment_method(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(details): Json<PaymentMethodDetails>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().update_payment_method(id, details).await {
        Ok(method) => (StatusCode::OK, Json(method)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_payment_method(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().delete_payment_method(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.store().create_category(body.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_categories().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().get_category(id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().update_category(id, body.name).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().delete_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn create_expense_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    match services.store().create_expense_category(body.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn list_expense_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_expense_categories().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn get_expense_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().get_expense_category(id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn update_expense_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::NamedRequest>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .store()
        .update_expense_category(id, body.name)
        .await
    {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(err) => domain_error_response(err),
    }
}

pub async fn delete_expense_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ref_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store().delete_expense_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => domain_error_response(err),
    }
}
