//! Billing domain module (invoices, line items, reference data).
//!
//! Invoice numbers are office-scoped: an upper-case prefix letter from the
//! office name plus a six-digit, gap-free sequence allocated at issuance.

pub mod invoice;
pub mod number;
pub mod reference;
pub mod scope;

pub use invoice::{
    Currency, Invoice, InvoiceDraft, ItemDraft, MerchandiseItem, PaymentStatus, PaymentType,
    ShippingStatus,
};
pub use number::InvoiceNumber;
pub use reference::{
    Category, PaymentMethod, PaymentMethodDetails, PaymentMethodKind, ShippingType,
};
pub use scope::InvoiceScope;
