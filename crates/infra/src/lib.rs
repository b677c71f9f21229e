//! Storage layer: the store seam, its two backends, and the audit sink.
//!
//! The in-memory backend serves dev and tests; Postgres serves production.

pub mod audit;
pub mod store;

pub use audit::StoreAuditSink;
pub use store::{
    AuditStore, ClientStore, FleetStore, InvoiceStore, LedgerStore, MemoryStore, NewInvoice,
    OfficeStore, PgStore, SettingsStore, Store, UserStore,
};
