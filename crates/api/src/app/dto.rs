//! Request bodies with no one-to-one domain counterpart.
//!
//! Most endpoints deserialize straight into the domain's details/draft
//! types; only the shapes below are HTTP-specific.

use serde::Deserialize;

use freightdesk_billing::PaymentStatus;
use freightdesk_core::{InvoiceId, UserId};

/// Body of `POST /manifests/:id/dispatch`.
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub invoice_ids: Vec<InvoiceId>,
    #[serde(default)]
    pub driver_id: Option<UserId>,
}

/// Body of `PATCH /invoices/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub payment_status: PaymentStatus,
}

/// Create/update body for the name-only reference collections.
#[derive(Debug, Deserialize)]
pub struct NamedRequest {
    pub name: String,
}
