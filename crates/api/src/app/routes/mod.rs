use axum::{routing::get, Router};

pub mod assets;
pub mod audit_logs;
pub mod clients;
pub mod company;
pub mod dashboard;
pub mod expenses;
pub mod invoices;
pub mod manifests;
pub mod offices;
pub mod settings;
pub mod suppliers;
pub mod system;
pub mod vehicles;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/offices", offices::router())
        .nest("/clients", clients::router())
        .nest("/invoices", invoices::router())
        .nest("/vehicles", vehicles::router())
        .nest("/manifests", manifests::router())
        .nest("/expenses", expenses::router())
        .nest("/suppliers", suppliers::router())
        .nest("/assets", assets::router())
        .nest("/asset-categories", assets::categories_router())
        .nest("/settings", settings::router())
        .nest("/company-info", company::router())
        .nest("/dashboard", dashboard::router())
        .nest("/audit-logs", audit_logs::router())
}
