//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use freightdesk_core::DomainError;

/// Build a `{ "error": code, "message": ... }` response body.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({ "error": code, "message": message.into() })),
    )
        .into_response()
}

/// Default mapping from domain failures to HTTP responses.
pub fn domain_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(message) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::Conflict(message) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::NotFound(message) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Retryable(message) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "retryable", message)
        }
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "unauthorized"),
        DomainError::Internal(message) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
        }
    }
}

/// The manifest dispatch/finalize surface reports state conflicts as
/// plain 400s, alongside its validation failures.
pub fn dispatch_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Conflict(message) => json_error(StatusCode::BAD_REQUEST, "conflict", message),
        other => domain_error_response(other),
    }
}
