//! Storage seam for the back office.
//!
//! Handlers talk to these traits only; implementations keep the issuance,
//! dispatch, and finalize operations atomic. Two backends exist: an
//! in-memory store for dev and tests and a Postgres store for production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightdesk_accounting::{
    Asset, AssetCategory, AssetDetails, CompanyInfo, CompanyInfoUpdate, DashboardStats, Expense,
    ExpenseCategory, ExpenseDetails, ExpenseScope, Supplier, SupplierDetails,
};
use freightdesk_audit::AuditRecord;
use freightdesk_auth::Actor;
use freightdesk_billing::{
    Category, Invoice, InvoiceDraft, InvoiceScope, PaymentMethod, PaymentMethodDetails,
    PaymentStatus, ShippingType,
};
use freightdesk_core::{
    AssetId, ClientId, DomainResult, InvoiceId, ManifestId, OfficeId, RefId, SupplierId, UserId,
    VehicleId,
};
use freightdesk_directory::{Client, ClientDetails, Office, OfficeDetails};
use freightdesk_fleet::{Manifest, ManifestDetails, Vehicle, VehicleDetails};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Everything an issuance request carries besides the actor: who sends,
/// who receives, and the invoice body itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub sender: ClientDetails,
    pub recipient: ClientDetails,
    #[serde(flatten)]
    pub draft: InvoiceDraft,
}

#[async_trait]
pub trait OfficeStore: Send + Sync {
    async fn create_office(&self, details: OfficeDetails) -> DomainResult<Office>;
    async fn list_offices(&self) -> DomainResult<Vec<Office>>;
    async fn get_office(&self, id: OfficeId) -> DomainResult<Office>;
    async fn update_office(&self, id: OfficeId, details: OfficeDetails) -> DomainResult<Office>;
    async fn delete_office(&self, id: OfficeId) -> DomainResult<()>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(&self, details: ClientDetails) -> DomainResult<Client>;
    async fn list_clients(&self) -> DomainResult<Vec<Client>>;
    async fn get_client(&self, id: ClientId) -> DomainResult<Client>;
    async fn update_client(&self, id: ClientId, details: ClientDetails) -> DomainResult<Client>;
    async fn delete_client(&self, id: ClientId) -> DomainResult<()>;
}

/// Identity mirror. Tokens are minted elsewhere; the store only keeps a
/// row per actor so invoice and manifest references resolve.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn sync_user(&self, actor: &Actor) -> DomainResult<()>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Issues an invoice in one atomic step: resolve or create both
    /// clients, allocate the office's next number under an exclusive row
    /// hold, persist invoice and items. Nothing survives a failure.
    async fn issue_invoice(
        &self,
        user_id: UserId,
        office_id: OfficeId,
        new: NewInvoice,
    ) -> DomainResult<Invoice>;

    async fn list_invoices(&self, scope: &InvoiceScope) -> DomainResult<Vec<Invoice>>;

    /// Scoped read: an invoice outside the caller's scope reads as absent.
    async fn get_invoice(&self, id: InvoiceId, scope: &InvoiceScope) -> DomainResult<Invoice>;

    async fn set_invoice_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
        scope: &InvoiceScope,
    ) -> DomainResult<Invoice>;
}

#[async_trait]
pub trait FleetStore: Send + Sync {
    async fn create_vehicle(&self, details: VehicleDetails) -> DomainResult<Vehicle>;
    async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>>;
    async fn get_vehicle(&self, id: VehicleId) -> DomainResult<Vehicle>;
    async fn update_vehicle(&self, id: VehicleId, details: VehicleDetails) -> DomainResult<Vehicle>;
    async fn delete_vehicle(&self, id: VehicleId) -> DomainResult<()>;

    async fn create_manifest(&self, details: ManifestDetails) -> DomainResult<Manifest>;
    async fn list_manifests(&self) -> DomainResult<Vec<Manifest>>;
    async fn get_manifest(&self, id: ManifestId) -> DomainResult<(Manifest, Vec<Invoice>)>;

    /// Sends a planned manifest out with the given invoices, atomically
    /// moving manifest, vehicle, and every invoice together.
    async fn dispatch_manifest(
        &self,
        id: ManifestId,
        invoice_ids: &[InvoiceId],
        driver_id: Option<UserId>,
    ) -> DomainResult<Manifest>;

    /// Closes an on-route trip, freeing the vehicle and delivering the
    /// manifest's invoices.
    async fn finalize_trip(&self, id: ManifestId) -> DomainResult<Manifest>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn record_expense(
        &self,
        details: ExpenseDetails,
        office_id: OfficeId,
        created_by: UserId,
    ) -> DomainResult<Expense>;
    async fn list_expenses(&self, scope: &ExpenseScope) -> DomainResult<Vec<Expense>>;

    async fn create_supplier(&self, details: SupplierDetails) -> DomainResult<Supplier>;
    async fn list_suppliers(&self) -> DomainResult<Vec<Supplier>>;
    async fn get_supplier(&self, id: SupplierId) -> DomainResult<Supplier>;
    async fn update_supplier(&self, id: SupplierId, details: SupplierDetails)
        -> DomainResult<Supplier>;
    async fn delete_supplier(&self, id: SupplierId) -> DomainResult<()>;

    async fn create_asset_category(&self, name: String) -> DomainResult<AssetCategory>;
    async fn list_asset_categories(&self) -> DomainResult<Vec<AssetCategory>>;
    async fn get_asset_category(&self, id: RefId) -> DomainResult<AssetCategory>;
    async fn update_asset_category(&self, id: RefId, name: String) -> DomainResult<AssetCategory>;
    async fn delete_asset_category(&self, id: RefId) -> DomainResult<()>;

    async fn create_asset(&self, details: AssetDetails) -> DomainResult<Asset>;
    async fn list_assets(&self) -> DomainResult<Vec<Asset>>;
    async fn get_asset(&self, id: AssetId) -> DomainResult<Asset>;
    async fn update_asset(&self, id: AssetId, details: AssetDetails) -> DomainResult<Asset>;
    async fn delete_asset(&self, id: AssetId) -> DomainResult<()>;

    async fn company_info(&self) -> DomainResult<CompanyInfo>;
    async fn update_company_info(&self, update: CompanyInfoUpdate) -> DomainResult<CompanyInfo>;

    async fn dashboard_stats(&self, now: DateTime<Utc>) -> DomainResult<DashboardStats>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn create_shipping_type(&self, name: String) -> DomainResult<ShippingType>;
    async fn list_shipping_types(&self) -> DomainResult<Vec<ShippingType>>;
    async fn get_shipping_type(&self, id: RefId) -> DomainResult<ShippingType>;
    async fn update_shipping_type(&self, id: RefId, name: String) -> DomainResult<ShippingType>;
    async fn delete_shipping_type(&self, id: RefId) -> DomainResult<()>;

    async fn create_payment_method(
        &self,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod>;
    async fn list_payment_methods(&self) -> DomainResult<Vec<PaymentMethod>>;
    async fn get_payment_method(&self, id: RefId) -> DomainResult<PaymentMethod>;
    async fn update_payment_method(
        &self,
        id: RefId,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod>;
    async fn delete_payment_method(&self, id: RefId) -> DomainResult<()>;

    async fn create_category(&self, name: String) -> DomainResult<Category>;
    async fn list_categories(&self) -> DomainResult<Vec<Category>>;
    async fn get_category(&self, id: RefId) -> DomainResult<Category>;
    async fn update_category(&self, id: RefId, name: String) -> DomainResult<Category>;
    async fn delete_category(&self, id: RefId) -> DomainResult<()>;

    async fn create_expense_category(&self, name: String) -> DomainResult<ExpenseCategory>;
    async fn list_expense_categories(&self) -> DomainResult<Vec<ExpenseCategory>>;
    async fn get_expense_category(&self, id: RefId) -> DomainResult<ExpenseCategory>;
    async fn update_expense_category(&self, id: RefId, name: String)
        -> DomainResult<ExpenseCategory>;
    async fn delete_expense_category(&self, id: RefId) -> DomainResult<()>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, record: AuditRecord) -> DomainResult<()>;
    /// Newest first.
    async fn list_audit_logs(&self) -> DomainResult<Vec<AuditRecord>>;
}

/// The full storage surface the HTTP layer is wired against.
pub trait Store:
    OfficeStore
    + ClientStore
    + UserStore
    + InvoiceStore
    + FleetStore
    + LedgerStore
    + SettingsStore
    + AuditStore
{
}

impl<T> Store for T where
    T: OfficeStore
        + ClientStore
        + UserStore
        + InvoiceStore
        + FleetStore
        + LedgerStore
        + SettingsStore
        + AuditStore
{
}
