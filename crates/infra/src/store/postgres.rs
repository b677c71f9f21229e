//! Postgres store backend.
//!
//! Issuance, dispatch, and finalize run inside explicit transactions with
//! `SELECT ... FOR UPDATE` row holds on the contended rows (office counter,
//! manifest, vehicle, invoice set). Lock waits are bounded by a
//! per-connection lock timeout and surface as retryable errors.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, PgConnection};
use tracing::instrument;
use uuid::Uuid;

use freightdesk_accounting::{
    month_window, Asset, AssetCategory, AssetDetails, CompanyInfo, CompanyInfoUpdate,
    DashboardStats, Expense, ExpenseCategory, ExpenseDetails, ExpenseScope, ShippingStatusCounts,
    Supplier, SupplierDetails,
};
use freightdesk_audit::AuditRecord;
use freightdesk_auth::Actor;
use freightdesk_billing::{
    Category, Invoice, InvoiceNumber, InvoiceScope, MerchandiseItem, PaymentMethod,
    PaymentMethodDetails, PaymentStatus, ShippingType,
};
use freightdesk_core::{
    AssetId, ClientId, DomainError, DomainResult, ExpenseId, InvoiceId, ItemId, ManifestId,
    OfficeId, RefId, SupplierId, UserId, VehicleId,
};
use freightdesk_directory::{Client, ClientDetails, Office, OfficeDetails};
use freightdesk_fleet::{
    verify_dispatch_set, Manifest, ManifestDetails, Vehicle, VehicleDetails,
};

use super::{
    AuditStore, ClientStore, FleetStore, InvoiceStore, LedgerStore, NewInvoice, OfficeStore,
    SettingsStore, UserStore,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, sender_id, recipient_id, origin_office_id, \
     destination_office_id, created_by, created_at, payment_status, shipping_status, \
     shipping_type_id, payment_method_id, payment_type, payment_currency, has_insurance, \
     declared_value, insurance_percentage, has_discount, discount_percentage, subtotal, tax, \
     ipostel, igtf, total, manifest_id";

/// Production store on Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, bounds lock waits, and applies embedded migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET lock_timeout = '5s'").await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_items(&self, invoices: &mut [Invoice]) -> DomainResult<()> {
        if invoices.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id.as_uuid()).collect();
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, invoice_id, quantity, description, weight, length, width, height, \
             category_id FROM invoice_items WHERE invoice_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load invoice items", e))?;

        let mut grouped: HashMap<Uuid, Vec<MerchandiseItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.invoice_id).or_default().push(row.into());
        }
        for invoice in invoices {
            invoice.items = grouped.remove(&invoice.id.as_uuid()).unwrap_or_default();
        }
        Ok(())
    }
}

/// Central sqlx-to-domain error mapping. Unique and foreign-key violations
/// become conflicts, check violations become validation errors, and lock or
/// serialization trouble becomes retryable.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::RowNotFound => DomainError::not_found(format!("{operation}: not found")),
        sqlx::Error::PoolTimedOut => {
            DomainError::retryable("timed out waiting for a database connection")
        }
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => DomainError::conflict(format!("{operation}: duplicate value")),
            Some("23503") => {
                DomainError::conflict(format!("{operation}: record is referenced by others"))
            }
            Some("23514") => DomainError::validation(format!("{operation}: constraint violated")),
            Some("55P03") | Some("40001") | Some("40P01") => {
                DomainError::retryable(format!("{operation}: contention, safe to retry"))
            }
            _ => {
                tracing::error!(operation, error = %err, "database error");
                DomainError::internal(format!("{operation} failed"))
            }
        },
        _ => {
            tracing::error!(operation, error = %err, "database error");
            DomainError::internal(format!("{operation} failed"))
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Enum columns are stored as their serde string form.
fn enum_str<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

fn parse_enum<T: DeserializeOwned>(raw: &str, what: &str) -> DomainResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| DomainError::internal(format!("stored {what} {raw:?} is not recognized")))
}

#[derive(sqlx::FromRow)]
struct OfficeRow {
    id: Uuid,
    name: String,
    address: String,
    phone: String,
    next_invoice_number: i32,
}

impl From<OfficeRow> for Office {
    fn from(row: OfficeRow) -> Self {
        Office::from_parts(
            OfficeId::from_uuid(row.id),
            row.name,
            row.address,
            row.phone,
            row.next_invoice_number as u32,
        )
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    id_type: String,
    id_number: String,
    name: String,
    phone: String,
    address: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = DomainError;

    fn try_from(row: ClientRow) -> DomainResult<Self> {
        Ok(Client {
            id: ClientId::from_uuid(row.id),
            id_type: row.id_type.parse()?,
            id_number: row.id_number,
            name: row.name,
            phone: row.phone,
            address: row.address,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    sender_id: Uuid,
    recipient_id: Uuid,
    origin_office_id: Uuid,
    destination_office_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    payment_status: String,
    shipping_status: String,
    shipping_type_id: Option<Uuid>,
    payment_method_id: Option<Uuid>,
    payment_type: String,
    payment_currency: String,
    has_insurance: bool,
    declared_value: Decimal,
    insurance_percentage: Decimal,
    has_discount: bool,
    discount_percentage: Decimal,
    subtotal: Decimal,
    tax: Decimal,
    ipostel: Decimal,
    igtf: Decimal,
    total: Decimal,
    manifest_id: Option<Uuid>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> DomainResult<Self> {
        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            invoice_number: row.invoice_number.parse()?,
            sender_id: ClientId::from_uuid(row.sender_id),
            recipient_id: ClientId::from_uuid(row.recipient_id),
            origin_office_id: OfficeId::from_uuid(row.origin_office_id),
            destination_office_id: OfficeId::from_uuid(row.destination_office_id),
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
            payment_status: parse_enum(&row.payment_status, "payment status")?,
            shipping_status: parse_enum(&row.shipping_status, "shipping status")?,
            shipping_type_id: row.shipping_type_id.map(RefId::from_uuid),
            payment_method_id: row.payment_method_id.map(RefId::from_uuid),
            payment_type: parse_enum(&row.payment_type, "payment type")?,
            payment_currency: parse_enum(&row.payment_currency, "currency")?,
            has_insurance: row.has_insurance,
            declared_value: row.declared_value,
            insurance_percentage: row.insurance_percentage,
            has_discount: row.has_discount,
            discount_percentage: row.discount_percentage,
            subtotal: row.subtotal,
            tax: row.tax,
            ipostel: row.ipostel,
            igtf: row.igtf,
            total: row.total,
            manifest_id: row.manifest_id.map(ManifestId::from_uuid),
            items: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    invoice_id: Uuid,
    quantity: i32,
    description: String,
    weight: Decimal,
    length: Decimal,
    width: Decimal,
    height: Decimal,
    category_id: Option<Uuid>,
}

impl From<ItemRow> for MerchandiseItem {
    fn from(row: ItemRow) -> Self {
        MerchandiseItem {
            id: ItemId::from_uuid(row.id),
            quantity: row.quantity as u32,
            description: row.description,
            weight: row.weight,
            length: row.length,
            width: row.width,
            height: row.height,
            category_id: row.category_id.map(RefId::from_uuid),
        }
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    license_plate: String,
    brand: String,
    model: String,
    year: i32,
    capacity_kg: Decimal,
    status: String,
    driver: Option<String>,
    image: Option<String>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = DomainError;

    fn try_from(row: VehicleRow) -> DomainResult<Self> {
        Ok(Vehicle {
            id: VehicleId::from_uuid(row.id),
            license_plate: row.license_plate,
            brand: row.brand,
            model: row.model,
            year: row.year as u16,
            capacity_kg: row.capacity_kg,
            status: parse_enum(&row.status, "vehicle status")?,
            driver: row.driver,
            image: row.image,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ManifestRow {
    id: Uuid,
    manifest_number: String,
    vehicle_id: Uuid,
    driver_id: Option<Uuid>,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    status: String,
}

impl TryFrom<ManifestRow> for Manifest {
    type Error = DomainError;

    fn try_from(row: ManifestRow) -> DomainResult<Self> {
        Ok(Manifest::from_parts(
            ManifestId::from_uuid(row.id),
            row.manifest_number,
            VehicleId::from_uuid(row.vehicle_id),
            row.driver_id.map(UserId::from_uuid),
            row.departure_time,
            row.arrival_time,
            parse_enum(&row.status, "manifest status")?,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    description: String,
    amount: Decimal,
    category: String,
    office_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: ExpenseId::from_uuid(row.id),
            description: row.description,
            amount: row.amount,
            category: row.category,
            office_id: OfficeId::from_uuid(row.office_id),
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    rif: String,
    phone: String,
    address: String,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: SupplierId::from_uuid(row.id),
            name: row.name,
            rif: row.rif,
            phone: row.phone,
            address: row.address,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct PaymentMethodRow {
    id: Uuid,
    name: String,
    kind: String,
    bank_name: String,
    account_number: String,
    beneficiary_name: String,
    beneficiary_id: String,
    phone: String,
    email: String,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = DomainError;

    fn try_from(row: PaymentMethodRow) -> DomainResult<Self> {
        Ok(PaymentMethod {
            id: RefId::from_uuid(row.id),
            name: row.name,
            kind: parse_enum(&row.kind, "payment method kind")?,
            bank_name: row.bank_name,
            account_number: row.account_number,
            beneficiary_name: row.beneficiary_name,
            beneficiary_id: row.beneficiary_id,
            phone: row.phone,
            email: row.email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    description: String,
    category_id: Option<Uuid>,
    office_id: Option<Uuid>,
    purchase_date: Option<NaiveDate>,
    purchase_value: Decimal,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: AssetId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            category_id: row.category_id.map(RefId::from_uuid),
            office_id: row.office_id.map(OfficeId::from_uuid),
            purchase_date: row.purchase_date,
            purchase_value: row.purchase_value,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CompanyInfoRow {
    name: String,
    rif: String,
    address: String,
    phone: String,
    postal_license: String,
    logo: Option<String>,
    login_image: Option<String>,
    cost_per_kg: Decimal,
    tax_rate: Decimal,
    bcv_rate: Decimal,
}

impl From<CompanyInfoRow> for CompanyInfo {
    fn from(row: CompanyInfoRow) -> Self {
        CompanyInfo {
            name: row.name,
            rif: row.rif,
            address: row.address,
            phone: row.phone,
            postal_license: row.postal_license,
            logo: row.logo,
            login_image: row.login_image,
            cost_per_kg: row.cost_per_kg,
            tax_rate: row.tax_rate,
            bcv_rate: row.bcv_rate,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    user_id: Option<Uuid>,
    action: String,
    details: String,
    timestamp: DateTime<Utc>,
}

impl From<AuditRow> for AuditRecord {
    fn from(row: AuditRow) -> Self {
        AuditRecord {
            id: freightdesk_core::AuditLogId::from_uuid(row.id),
            user_id: row.user_id.map(UserId::from_uuid),
            action: row.action,
            details: row.details,
            timestamp: row.timestamp,
        }
    }
}

fn invoice_scope_binds(scope: &InvoiceScope) -> (Option<Uuid>, Option<Uuid>) {
    match scope {
        InvoiceScope::All => (None, None),
        InvoiceScope::Office(office) => (Some(office.as_uuid()), None),
        InvoiceScope::CreatedBy(user) => (None, Some(user.as_uuid())),
    }
}

async fn record_exists(
    conn: &mut PgConnection,
    table: &str,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    // `table` is always a compile-time constant from this module.
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    sqlx::query_scalar(&sql).bind(id).fetch_one(conn).await
}

/// Get-or-create by identity key. An existing row wins; its fields are
/// left exactly as they are.
async fn resolve_client(conn: &mut PgConnection, details: &ClientDetails) -> DomainResult<ClientId> {
    let key = details.key();
    sqlx::query(
        "INSERT INTO clients (id, id_type, id_number, name, phone, address) \
         VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id_type, id_number) DO NOTHING",
    )
    .bind(ClientId::new().as_uuid())
    .bind(key.id_type.as_str())
    .bind(&key.id_number)
    .bind(&details.name)
    .bind(&details.phone)
    .bind(&details.address)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("resolve client", e))?;

    let id: Uuid =
        sqlx::query_scalar("SELECT id FROM clients WHERE id_type = $1 AND id_number = $2")
            .bind(key.id_type.as_str())
            .bind(&key.id_number)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("resolve client", e))?;
    Ok(ClientId::from_uuid(id))
}

#[async_trait]
impl OfficeStore for PgStore {
    async fn create_office(&self, details: OfficeDetails) -> DomainResult<Office> {
        let office = Office::new(OfficeId::new(), details)?;
        sqlx::query(
            "INSERT INTO offices (id, name, address, phone, next_invoice_number) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(office.id().as_uuid())
        .bind(office.name())
        .bind(office.address())
        .bind(office.phone())
        .bind(office.next_invoice_number() as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("office name already exists")
            } else {
                map_sqlx_error("create office", e)
            }
        })?;
        Ok(office)
    }

    async fn list_offices(&self) -> DomainResult<Vec<Office>> {
        let rows: Vec<OfficeRow> = sqlx::query_as(
            "SELECT id, name, address, phone, next_invoice_number FROM offices ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list offices", e))?;
        Ok(rows.into_iter().map(Office::from).collect())
    }

    async fn get_office(&self, id: OfficeId) -> DomainResult<Office> {
        let row: Option<OfficeRow> = sqlx::query_as(
            "SELECT id, name, address, phone, next_invoice_number FROM offices WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get office", e))?;
        row.map(Office::from)
            .ok_or_else(|| DomainError::not_found("office not found"))
    }

    async fn update_office(&self, id: OfficeId, details: OfficeDetails) -> DomainResult<Office> {
        details.validate()?;
        let row: Option<OfficeRow> = sqlx::query_as(
            "UPDATE offices SET name = $2, address = $3, phone = $4 WHERE id = $1 \
             RETURNING id, name, address, phone, next_invoice_number",
        )
        .bind(id.as_uuid())
        .bind(details.name.trim())
        .bind(&details.address)
        .bind(&details.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("office name already exists")
            } else {
                map_sqlx_error("update office", e)
            }
        })?;
        row.map(Office::from)
            .ok_or_else(|| DomainError::not_found("office not found"))
    }

    async fn delete_office(&self, id: OfficeId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM offices WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete office", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("office not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn create_client(&self, details: ClientDetails) -> DomainResult<Client> {
        let client = Client::from_details(ClientId::new(), details)?;
        sqlx::query(
            "INSERT INTO clients (id, id_type, id_number, name, phone, address) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(client.id.as_uuid())
        .bind(client.id_type.as_str())
        .bind(&client.id_number)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("client identity already exists")
            } else {
                map_sqlx_error("create client", e)
            }
        })?;
        Ok(client)
    }

    async fn list_clients(&self) -> DomainResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT id, id_type, id_number, name, phone, address FROM clients \
             ORDER BY name, id_number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list clients", e))?;
        rows.into_iter().map(Client::try_from).collect()
    }

    async fn get_client(&self, id: ClientId) -> DomainResult<Client> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, id_type, id_number, name, phone, address FROM clients WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get client", e))?;
        row.ok_or_else(|| DomainError::not_found("client not found"))?
            .try_into()
    }

    async fn update_client(&self, id: ClientId, details: ClientDetails) -> DomainResult<Client> {
        details.validate()?;
        let key = details.key();
        let row: Option<ClientRow> = sqlx::query_as(
            "UPDATE clients SET id_type = $2, id_number = $3, name = $4, phone = $5, \
             address = $6 WHERE id = $1 \
             RETURNING id, id_type, id_number, name, phone, address",
        )
        .bind(id.as_uuid())
        .bind(key.id_type.as_str())
        .bind(&key.id_number)
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("client identity already exists")
            } else {
                map_sqlx_error("update client", e)
            }
        })?;
        row.ok_or_else(|| DomainError::not_found("client not found"))?
            .try_into()
    }

    async fn delete_client(&self, id: ClientId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete client", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("client not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn sync_user(&self, actor: &Actor) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, office_id, role) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username, \
             office_id = EXCLUDED.office_id, role = EXCLUDED.role",
        )
        .bind(actor.user_id.as_uuid())
        .bind(&actor.username)
        .bind(actor.office_id.map(|o| o.as_uuid()))
        .bind(enum_str(&actor.role))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sync user", e))?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for PgStore {
    #[instrument(
        skip(self, new),
        fields(office_id = %office_id, invoice_number = tracing::field::Empty),
        err
    )]
    async fn issue_invoice(
        &self,
        user_id: UserId,
        office_id: OfficeId,
        new: NewInvoice,
    ) -> DomainResult<Invoice> {
        new.sender.validate()?;
        new.recipient.validate()?;
        new.draft.validate()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("issue invoice", e))?;

        // Referenced records must exist before any row is written.
        if !record_exists(&mut tx, "offices", new.draft.destination_office_id.as_uuid())
            .await
            .map_err(|e| map_sqlx_error("issue invoice", e))?
        {
            return Err(DomainError::not_found("destination office not found"));
        }
        if let Some(st) = new.draft.shipping_type_id {
            if !record_exists(&mut tx, "shipping_types", st.as_uuid())
                .await
                .map_err(|e| map_sqlx_error("issue invoice", e))?
            {
                return Err(DomainError::not_found("shipping type not found"));
            }
        }
        if let Some(pm) = new.draft.payment_method_id {
            if !record_exists(&mut tx, "payment_methods", pm.as_uuid())
                .await
                .map_err(|e| map_sqlx_error("issue invoice", e))?
            {
                return Err(DomainError::not_found("payment method not found"));
            }
        }
        let categories: HashSet<RefId> =
            new.draft.items.iter().filter_map(|i| i.category_id).collect();
        for category in categories {
            if !record_exists(&mut tx, "categories", category.as_uuid())
                .await
                .map_err(|e| map_sqlx_error("issue invoice", e))?
            {
                return Err(DomainError::not_found("category not found"));
            }
        }

        let sender_id = resolve_client(&mut tx, &new.sender).await?;
        let recipient_id = resolve_client(&mut tx, &new.recipient).await?;

        // Exclusive hold on the office row serializes same-office issuance.
        let row: Option<OfficeRow> = sqlx::query_as(
            "SELECT id, name, address, phone, next_invoice_number FROM offices \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(office_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("issue invoice", e))?;
        let mut office =
            Office::from(row.ok_or_else(|| DomainError::not_found("office not found"))?);

        let (sequence, prefix) = office.allocate_invoice_number();
        sqlx::query("UPDATE offices SET next_invoice_number = $2 WHERE id = $1")
            .bind(office_id.as_uuid())
            .bind(office.next_invoice_number() as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("issue invoice", e))?;

        let number = InvoiceNumber::compose(prefix, sequence);
        tracing::Span::current().record("invoice_number", number.as_str());

        let invoice = Invoice::issue(
            number,
            sender_id,
            recipient_id,
            office_id,
            user_id,
            Utc::now(),
            &new.draft,
        )?;

        sqlx::query(&format!(
            "INSERT INTO invoices ({INVOICE_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25)"
        ))
        .bind(invoice.id.as_uuid())
        .bind(invoice.invoice_number.as_str())
        .bind(invoice.sender_id.as_uuid())
        .bind(invoice.recipient_id.as_uuid())
        .bind(invoice.origin_office_id.as_uuid())
        .bind(invoice.destination_office_id.as_uuid())
        .bind(invoice.created_by.as_uuid())
        .bind(invoice.created_at)
        .bind(enum_str(&invoice.payment_status))
        .bind(enum_str(&invoice.shipping_status))
        .bind(invoice.shipping_type_id.map(|r| r.as_uuid()))
        .bind(invoice.payment_method_id.map(|r| r.as_uuid()))
        .bind(enum_str(&invoice.payment_type))
        .bind(enum_str(&invoice.payment_currency))
        .bind(invoice.has_insurance)
        .bind(invoice.declared_value)
        .bind(invoice.insurance_percentage)
        .bind(invoice.has_discount)
        .bind(invoice.discount_percentage)
        .bind(invoice.subtotal)
        .bind(invoice.tax)
        .bind(invoice.ipostel)
        .bind(invoice.igtf)
        .bind(invoice.total)
        .bind(invoice.manifest_id.map(|m| m.as_uuid()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("invoice number already exists")
            } else {
                map_sqlx_error("issue invoice", e)
            }
        })?;

        for item in &invoice.items {
            sqlx::query(
                "INSERT INTO invoice_items (id, invoice_id, quantity, description, weight, \
                 length, width, height, category_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(item.id.as_uuid())
            .bind(invoice.id.as_uuid())
            .bind(item.quantity as i32)
            .bind(&item.description)
            .bind(item.weight)
            .bind(item.length)
            .bind(item.width)
            .bind(item.height)
            .bind(item.category_id.map(|r| r.as_uuid()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("issue invoice", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("issue invoice", e))?;
        Ok(invoice)
    }

    async fn list_invoices(&self, scope: &InvoiceScope) -> DomainResult<Vec<Invoice>> {
        let (office, user) = invoice_scope_binds(scope);
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE ($1::uuid IS NULL OR origin_office_id = $1) \
             AND ($2::uuid IS NULL OR created_by = $2) \
             ORDER BY created_at DESC, invoice_number DESC"
        ))
        .bind(office)
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list invoices", e))?;
        let mut invoices: Vec<Invoice> = rows
            .into_iter()
            .map(Invoice::try_from)
            .collect::<DomainResult<_>>()?;
        self.attach_items(&mut invoices).await?;
        Ok(invoices)
    }

    async fn get_invoice(&self, id: InvoiceId, scope: &InvoiceScope) -> DomainResult<Invoice> {
        let (office, user) = invoice_scope_binds(scope);
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 \
             AND ($2::uuid IS NULL OR origin_office_id = $2) \
             AND ($3::uuid IS NULL OR created_by = $3)"
        ))
        .bind(id.as_uuid())
        .bind(office)
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get invoice", e))?;
        let mut invoice =
            Invoice::try_from(row.ok_or_else(|| DomainError::not_found("invoice not found"))?)?;
        self.attach_items(std::slice::from_mut(&mut invoice)).await?;
        Ok(invoice)
    }

    async fn set_invoice_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
        scope: &InvoiceScope,
    ) -> DomainResult<Invoice> {
        let (office, user) = invoice_scope_binds(scope);
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "UPDATE invoices SET payment_status = $4 WHERE id = $1 \
             AND ($2::uuid IS NULL OR origin_office_id = $2) \
             AND ($3::uuid IS NULL OR created_by = $3) \
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(office)
        .bind(user)
        .bind(enum_str(&status))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set payment status", e))?;
        let mut invoice =
            Invoice::try_from(row.ok_or_else(|| DomainError::not_found("invoice not found"))?)?;
        self.attach_items(std::slice::from_mut(&mut invoice)).await?;
        Ok(invoice)
    }
}

#[async_trait]
impl FleetStore for PgStore {
    async fn create_vehicle(&self, details: VehicleDetails) -> DomainResult<Vehicle> {
        let vehicle = Vehicle::from_details(details)?;
        sqlx::query(
            "INSERT INTO vehicles (id, license_plate, brand, model, year, capacity_kg, \
             status, driver, image) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(vehicle.id.as_uuid())
        .bind(&vehicle.license_plate)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(vehicle.year as i32)
        .bind(vehicle.capacity_kg)
        .bind(enum_str(&vehicle.status))
        .bind(&vehicle.driver)
        .bind(&vehicle.image)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("license plate already exists")
            } else {
                map_sqlx_error("create vehicle", e)
            }
        })?;
        Ok(vehicle)
    }

    async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>> {
        let rows: Vec<VehicleRow> = sqlx::query_as(
            "SELECT id, license_plate, brand, model, year, capacity_kg, status, driver, \
             image FROM vehicles ORDER BY license_plate",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list vehicles", e))?;
        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn get_vehicle(&self, id: VehicleId) -> DomainResult<Vehicle> {
        let row: Option<VehicleRow> = sqlx::query_as(
            "SELECT id, license_plate, brand, model, year, capacity_kg, status, driver, \
             image FROM vehicles WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get vehicle", e))?;
        row.ok_or_else(|| DomainError::not_found("vehicle not found"))?
            .try_into()
    }

    async fn update_vehicle(
        &self,
        id: VehicleId,
        details: VehicleDetails,
    ) -> DomainResult<Vehicle> {
        details.validate()?;
        let row: Option<VehicleRow> = sqlx::query_as(
            "UPDATE vehicles SET license_plate = $2, brand = $3, model = $4, year = $5, \
             capacity_kg = $6, driver = $7, image = $8 WHERE id = $1 \
             RETURNING id, license_plate, brand, model, year, capacity_kg, status, driver, image",
        )
        .bind(id.as_uuid())
        .bind(details.license_plate.trim())
        .bind(&details.brand)
        .bind(&details.model)
        .bind(details.year as i32)
        .bind(details.capacity_kg)
        .bind(&details.driver)
        .bind(&details.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("license plate already exists")
            } else {
                map_sqlx_error("update vehicle", e)
            }
        })?;
        row.ok_or_else(|| DomainError::not_found("vehicle not found"))?
            .try_into()
    }

    async fn delete_vehicle(&self, id: VehicleId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete vehicle", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("vehicle not found"));
        }
        Ok(())
    }

    async fn create_manifest(&self, details: ManifestDetails) -> DomainResult<Manifest> {
        details.validate()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create manifest", e))?;
        if !record_exists(&mut tx, "vehicles", details.vehicle_id.as_uuid())
            .await
            .map_err(|e| map_sqlx_error("create manifest", e))?
        {
            return Err(DomainError::not_found("vehicle not found"));
        }
        if let Some(driver) = details.driver_id {
            if !record_exists(&mut tx, "users", driver.as_uuid())
                .await
                .map_err(|e| map_sqlx_error("create manifest", e))?
            {
                return Err(DomainError::not_found("driver not found"));
            }
        }
        let manifest = Manifest::new(details)?;
        sqlx::query(
            "INSERT INTO manifests (id, manifest_number, vehicle_id, driver_id, \
             departure_time, arrival_time, status) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(manifest.id().as_uuid())
        .bind(manifest.manifest_number())
        .bind(manifest.vehicle_id().as_uuid())
        .bind(manifest.driver_id().map(|d| d.as_uuid()))
        .bind(manifest.departure_time())
        .bind(manifest.arrival_time())
        .bind(enum_str(&manifest.status()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("manifest number already exists")
            } else {
                map_sqlx_error("create manifest", e)
            }
        })?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create manifest", e))?;
        Ok(manifest)
    }

    async fn list_manifests(&self) -> DomainResult<Vec<Manifest>> {
        let rows: Vec<ManifestRow> = sqlx::query_as(
            "SELECT id, manifest_number, vehicle_id, driver_id, departure_time, \
             arrival_time, status FROM manifests ORDER BY manifest_number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list manifests", e))?;
        rows.into_iter().map(Manifest::try_from).collect()
    }

    async fn get_manifest(&self, id: ManifestId) -> DomainResult<(Manifest, Vec<Invoice>)> {
        let row: Option<ManifestRow> = sqlx::query_as(
            "SELECT id, manifest_number, vehicle_id, driver_id, departure_time, \
             arrival_time, status FROM manifests WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get manifest", e))?;
        let manifest =
            Manifest::try_from(row.ok_or_else(|| DomainError::not_found("manifest not found"))?)?;

        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE manifest_id = $1 \
             ORDER BY invoice_number"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get manifest", e))?;
        let mut invoices: Vec<Invoice> = rows
            .into_iter()
            .map(Invoice::try_from)
            .collect::<DomainResult<_>>()?;
        self.attach_items(&mut invoices).await?;
        Ok((manifest, invoices))
    }

    #[instrument(skip(self, invoice_ids), fields(manifest_id = %id, invoices = invoice_ids.len()), err)]
    async fn dispatch_manifest(
        &self,
        id: ManifestId,
        invoice_ids: &[InvoiceId],
        driver_id: Option<UserId>,
    ) -> DomainResult<Manifest> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("dispatch manifest", e))?;

        let row: Option<ManifestRow> = sqlx::query_as(
            "SELECT id, manifest_number, vehicle_id, driver_id, departure_time, \
             arrival_time, status FROM manifests WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch manifest", e))?;
        let mut manifest =
            Manifest::try_from(row.ok_or_else(|| DomainError::not_found("manifest not found"))?)?;

        let row: Option<VehicleRow> = sqlx::query_as(
            "SELECT id, license_plate, brand, model, year, capacity_kg, status, driver, \
             image FROM vehicles WHERE id = $1 FOR UPDATE",
        )
        .bind(manifest.vehicle_id().as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch manifest", e))?;
        let mut vehicle =
            Vehicle::try_from(row.ok_or_else(|| DomainError::not_found("vehicle not found"))?)?;

        // Runs the whole transition in memory first; rows are updated only
        // when every precondition holds.
        manifest.dispatch(&mut vehicle, driver_id, Utc::now())?;

        if let Some(driver) = driver_id {
            if !record_exists(&mut tx, "users", driver.as_uuid())
                .await
                .map_err(|e| map_sqlx_error("dispatch manifest", e))?
            {
                return Err(DomainError::not_found("driver not found"));
            }
        }

        let requested: Vec<Uuid> = invoice_ids.iter().map(|i| i.as_uuid()).collect();
        let matched: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM invoices WHERE id = ANY($1) \
             AND shipping_status = 'pending_dispatch' FOR UPDATE",
        )
        .bind(&requested)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch manifest", e))?;
        verify_dispatch_set(invoice_ids.len(), matched.len())?;

        sqlx::query(
            "UPDATE invoices SET shipping_status = 'in_transit', manifest_id = $2 \
             WHERE id = ANY($1)",
        )
        .bind(&matched)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch manifest", e))?;

        sqlx::query(
            "UPDATE manifests SET status = $2, departure_time = $3, driver_id = $4 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(enum_str(&manifest.status()))
        .bind(manifest.departure_time())
        .bind(manifest.driver_id().map(|d| d.as_uuid()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch manifest", e))?;

        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(vehicle.id.as_uuid())
            .bind(enum_str(&vehicle.status))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("dispatch manifest", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("dispatch manifest", e))?;
        Ok(manifest)
    }

    #[instrument(skip(self), fields(manifest_id = %id), err)]
    async fn finalize_trip(&self, id: ManifestId) -> DomainResult<Manifest> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("finalize trip", e))?;

        let row: Option<ManifestRow> = sqlx::query_as(
            "SELECT id, manifest_number, vehicle_id, driver_id, departure_time, \
             arrival_time, status FROM manifests WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("finalize trip", e))?;
        let mut manifest =
            Manifest::try_from(row.ok_or_else(|| DomainError::not_found("manifest not found"))?)?;

        let row: Option<VehicleRow> = sqlx::query_as(
            "SELECT id, license_plate, brand, model, year, capacity_kg, status, driver, \
             image FROM vehicles WHERE id = $1 FOR UPDATE",
        )
        .bind(manifest.vehicle_id().as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("finalize trip", e))?;
        let mut vehicle =
            Vehicle::try_from(row.ok_or_else(|| DomainError::not_found("vehicle not found"))?)?;

        manifest.finalize_trip(&mut vehicle, Utc::now())?;

        sqlx::query(
            "UPDATE manifests SET status = $2, arrival_time = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(enum_str(&manifest.status()))
        .bind(manifest.arrival_time())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("finalize trip", e))?;

        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(vehicle.id.as_uuid())
            .bind(enum_str(&vehicle.status))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("finalize trip", e))?;

        sqlx::query(
            "UPDATE invoices SET shipping_status = 'delivered' WHERE manifest_id = $1",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("finalize trip", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("finalize trip", e))?;
        Ok(manifest)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn record_expense(
        &self,
        details: ExpenseDetails,
        office_id: OfficeId,
        created_by: UserId,
    ) -> DomainResult<Expense> {
        details.validate()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("record expense", e))?;
        if !record_exists(&mut tx, "offices", office_id.as_uuid())
            .await
            .map_err(|e| map_sqlx_error("record expense", e))?
        {
            return Err(DomainError::not_found("office not found"));
        }
        let expense = Expense::record(details, office_id, created_by, Utc::now())?;
        sqlx::query(
            "INSERT INTO expenses (id, description, amount, category, office_id, \
             created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(expense.id.as_uuid())
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(&expense.category)
        .bind(expense.office_id.as_uuid())
        .bind(expense.created_by.as_uuid())
        .bind(expense.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("record expense", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("record expense", e))?;
        Ok(expense)
    }

    async fn list_expenses(&self, scope: &ExpenseScope) -> DomainResult<Vec<Expense>> {
        let office = match scope {
            ExpenseScope::All => None,
            ExpenseScope::Office(o) => Some(o.as_uuid()),
        };
        let rows: Vec<ExpenseRow> = sqlx::query_as(
            "SELECT id, description, amount, category, office_id, created_by, created_at \
             FROM expenses WHERE ($1::uuid IS NULL OR office_id = $1) \
             ORDER BY created_at DESC",
        )
        .bind(office)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list expenses", e))?;
        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn create_supplier(&self, details: SupplierDetails) -> DomainResult<Supplier> {
        let supplier = Supplier::from_details(details)?;
        sqlx::query(
            "INSERT INTO suppliers (id, name, rif, phone, address) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.rif)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("supplier name already exists")
            } else {
                map_sqlx_error("create supplier", e)
            }
        })?;
        Ok(supplier)
    }

    async fn list_suppliers(&self) -> DomainResult<Vec<Supplier>> {
        let rows: Vec<SupplierRow> =
            sqlx::query_as("SELECT id, name, rif, phone, address FROM suppliers ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list suppliers", e))?;
        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    async fn get_supplier(&self, id: SupplierId) -> DomainResult<Supplier> {
        let row: Option<SupplierRow> =
            sqlx::query_as("SELECT id, name, rif, phone, address FROM suppliers WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get supplier", e))?;
        row.map(Supplier::from)
            .ok_or_else(|| DomainError::not_found("supplier not found"))
    }

    async fn update_supplier(
        &self,
        id: SupplierId,
        details: SupplierDetails,
    ) -> DomainResult<Supplier> {
        details.validate()?;
        let row: Option<SupplierRow> = sqlx::query_as(
            "UPDATE suppliers SET name = $2, rif = $3, phone = $4, address = $5 \
             WHERE id = $1 RETURNING id, name, rif, phone, address",
        )
        .bind(id.as_uuid())
        .bind(&details.name)
        .bind(&details.rif)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("supplier name already exists")
            } else {
                map_sqlx_error("update supplier", e)
            }
        })?;
        row.map(Supplier::from)
            .ok_or_else(|| DomainError::not_found("supplier not found"))
    }

    async fn delete_supplier(&self, id: SupplierId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete supplier", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("supplier not found"));
        }
        Ok(())
    }

    async fn create_asset_category(&self, name: String) -> DomainResult<AssetCategory> {
        let category = AssetCategory::new(name)?;
        sqlx::query("INSERT INTO asset_categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict("asset category name already exists")
                } else {
                    map_sqlx_error("create asset category", e)
                }
            })?;
        Ok(category)
    }

    async fn list_asset_categories(&self) -> DomainResult<Vec<AssetCategory>> {
        let rows: Vec<NamedRow> =
            sqlx::query_as("SELECT id, name FROM asset_categories ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list asset categories", e))?;
        Ok(rows
            .into_iter()
            .map(|r| AssetCategory {
                id: RefId::from_uuid(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn get_asset_category(&self, id: RefId) -> DomainResult<AssetCategory> {
        let row: Option<NamedRow> =
            sqlx::query_as("SELECT id, name FROM asset_categories WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get asset category", e))?;
        row.map(|r| AssetCategory {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("asset category not found"))
    }

    async fn update_asset_category(&self, id: RefId, name: String) -> DomainResult<AssetCategory> {
        let replacement = AssetCategory::new(name)?;
        let row: Option<NamedRow> = sqlx::query_as(
            "UPDATE asset_categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id.as_uuid())
        .bind(&replacement.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("asset category name already exists")
            } else {
                map_sqlx_error("update asset category", e)
            }
        })?;
        row.map(|r| AssetCategory {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("asset category not found"))
    }

    async fn delete_asset_category(&self, id: RefId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM asset_categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete asset category", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("asset category not found"));
        }
        Ok(())
    }

    async fn create_asset(&self, details: AssetDetails) -> DomainResult<Asset> {
        let asset = Asset::from_details(details)?;
        sqlx::query(
            "INSERT INTO assets (id, name, description, category_id, office_id, \
             purchase_date, purchase_value) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(asset.id.as_uuid())
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(asset.category_id.map(|c| c.as_uuid()))
        .bind(asset.office_id.map(|o| o.as_uuid()))
        .bind(asset.purchase_date)
        .bind(asset.purchase_value)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create asset", e))?;
        Ok(asset)
    }

    async fn list_assets(&self) -> DomainResult<Vec<Asset>> {
        let rows: Vec<AssetRow> = sqlx::query_as(
            "SELECT id, name, description, category_id, office_id, purchase_date, \
             purchase_value FROM assets ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list assets", e))?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    async fn get_asset(&self, id: AssetId) -> DomainResult<Asset> {
        let row: Option<AssetRow> = sqlx::query_as(
            "SELECT id, name, description, category_id, office_id, purchase_date, \
             purchase_value FROM assets WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get asset", e))?;
        row.map(Asset::from)
            .ok_or_else(|| DomainError::not_found("asset not found"))
    }

    async fn update_asset(&self, id: AssetId, details: AssetDetails) -> DomainResult<Asset> {
        details.validate()?;
        let row: Option<AssetRow> = sqlx::query_as(
            "UPDATE assets SET name = $2, description = $3, category_id = $4, \
             office_id = $5, purchase_date = $6, purchase_value = $7 WHERE id = $1 \
             RETURNING id, name, description, category_id, office_id, purchase_date, \
             purchase_value",
        )
        .bind(id.as_uuid())
        .bind(&details.name)
        .bind(&details.description)
        .bind(details.category_id.map(|c| c.as_uuid()))
        .bind(details.office_id.map(|o| o.as_uuid()))
        .bind(details.purchase_date)
        .bind(details.purchase_value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update asset", e))?;
        row.map(Asset::from)
            .ok_or_else(|| DomainError::not_found("asset not found"))
    }

    async fn delete_asset(&self, id: AssetId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete asset", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("asset not found"));
        }
        Ok(())
    }

    async fn company_info(&self) -> DomainResult<CompanyInfo> {
        let row: Option<CompanyInfoRow> = sqlx::query_as(
            "SELECT name, rif, address, phone, postal_license, logo, login_image, \
             cost_per_kg, tax_rate, bcv_rate FROM company_info WHERE id",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("company info", e))?;
        Ok(row.map(CompanyInfo::from).unwrap_or_default())
    }

    async fn update_company_info(&self, update: CompanyInfoUpdate) -> DomainResult<CompanyInfo> {
        let row: CompanyInfoRow = sqlx::query_as(
            "UPDATE company_info SET \
             name = COALESCE($1, name), rif = COALESCE($2, rif), \
             address = COALESCE($3, address), phone = COALESCE($4, phone), \
             postal_license = COALESCE($5, postal_license), logo = COALESCE($6, logo), \
             login_image = COALESCE($7, login_image), \
             cost_per_kg = COALESCE($8, cost_per_kg), tax_rate = COALESCE($9, tax_rate), \
             bcv_rate = COALESCE($10, bcv_rate) WHERE id \
             RETURNING name, rif, address, phone, postal_license, logo, login_image, \
             cost_per_kg, tax_rate, bcv_rate",
        )
        .bind(update.name)
        .bind(update.rif)
        .bind(update.address)
        .bind(update.phone)
        .bind(update.postal_license)
        .bind(update.logo)
        .bind(update.login_image)
        .bind(update.cost_per_kg)
        .bind(update.tax_rate)
        .bind(update.bcv_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update company info", e))?;
        Ok(row.into())
    }

    async fn dashboard_stats(&self, now: DateTime<Utc>) -> DomainResult<DashboardStats> {
        let (start, end) = month_window(now);

        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM invoices \
             WHERE created_at >= $1 AND created_at < $2 AND payment_status <> 'voided'",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("dashboard stats", e))?;

        let expenses: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses \
             WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("dashboard stats", e))?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT shipping_status, COUNT(*) FROM invoices GROUP BY shipping_status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("dashboard stats", e))?;
        let mut counts = ShippingStatusCounts::default();
        for (status, count) in rows {
            let count = count as u64;
            match status.as_str() {
                "pending_dispatch" => counts.pending_dispatch = count,
                "in_transit" => counts.in_transit = count,
                "delivered" => counts.delivered = count,
                "returned" => counts.returned = count,
                other => tracing::warn!(status = other, "unrecognized shipping status"),
            }
        }

        Ok(DashboardStats::from_totals(revenue, expenses, counts))
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn create_shipping_type(&self, name: String) -> DomainResult<ShippingType> {
        let entry = ShippingType::new(name)?;
        sqlx::query("INSERT INTO shipping_types (id, name) VALUES ($1, $2)")
            .bind(entry.id.as_uuid())
            .bind(&entry.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict("shipping type name already exists")
                } else {
                    map_sqlx_error("create shipping type", e)
                }
            })?;
        Ok(entry)
    }

    async fn list_shipping_types(&self) -> DomainResult<Vec<ShippingType>> {
        let rows: Vec<NamedRow> =
            sqlx::query_as("SELECT id, name FROM shipping_types ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list shipping types", e))?;
        Ok(rows
            .into_iter()
            .map(|r| ShippingType {
                id: RefId::from_uuid(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn get_shipping_type(&self, id: RefId) -> DomainResult<ShippingType> {
        let row: Option<NamedRow> =
            sqlx::query_as("SELECT id, name FROM shipping_types WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get shipping type", e))?;
        row.map(|r| ShippingType {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("shipping type not found"))
    }

    async fn update_shipping_type(&self, id: RefId, name: String) -> DomainResult<ShippingType> {
        let replacement = ShippingType::new(name)?;
        let row: Option<NamedRow> = sqlx::query_as(
            "UPDATE shipping_types SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id.as_uuid())
        .bind(&replacement.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("shipping type name already exists")
            } else {
                map_sqlx_error("update shipping type", e)
            }
        })?;
        row.map(|r| ShippingType {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("shipping type not found"))
    }

    async fn delete_shipping_type(&self, id: RefId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM shipping_types WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete shipping type", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("shipping type not found"));
        }
        Ok(())
    }

    async fn create_payment_method(
        &self,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod> {
        let method = PaymentMethod::from_details(details)?;
        sqlx::query(
            "INSERT INTO payment_methods (id, name, kind, bank_name, account_number, \
             beneficiary_name, beneficiary_id, phone, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(method.id.as_uuid())
        .bind(&method.name)
        .bind(enum_str(&method.kind))
        .bind(&method.bank_name)
        .bind(&method.account_number)
        .bind(&method.beneficiary_name)
        .bind(&method.beneficiary_id)
        .bind(&method.phone)
        .bind(&method.email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("payment method name already exists")
            } else {
                map_sqlx_error("create payment method", e)
            }
        })?;
        Ok(method)
    }

    async fn list_payment_methods(&self) -> DomainResult<Vec<PaymentMethod>> {
        let rows: Vec<PaymentMethodRow> = sqlx::query_as(
            "SELECT id, name, kind, bank_name, account_number, beneficiary_name, \
             beneficiary_id, phone, email FROM payment_methods ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list payment methods", e))?;
        rows.into_iter().map(PaymentMethod::try_from).collect()
    }

    async fn get_payment_method(&self, id: RefId) -> DomainResult<PaymentMethod> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(
            "SELECT id, name, kind, bank_name, account_number, beneficiary_name, \
             beneficiary_id, phone, email FROM payment_methods WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get payment method", e))?;
        row.ok_or_else(|| DomainError::not_found("payment method not found"))?
            .try_into()
    }

    async fn update_payment_method(
        &self,
        id: RefId,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod> {
        details.validate()?;
        let row: Option<PaymentMethodRow> = sqlx::query_as(
            "UPDATE payment_methods SET name = $2, kind = $3, bank_name = $4, \
             account_number = $5, beneficiary_name = $6, beneficiary_id = $7, phone = $8, \
             email = $9 WHERE id = $1 \
             RETURNING id, name, kind, bank_name, account_number, beneficiary_name, \
             beneficiary_id, phone, email",
        )
        .bind(id.as_uuid())
        .bind(&details.name)
        .bind(enum_str(&details.kind))
        .bind(&details.bank_name)
        .bind(&details.account_number)
        .bind(&details.beneficiary_name)
        .bind(&details.beneficiary_id)
        .bind(&details.phone)
        .bind(&details.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("payment method name already exists")
            } else {
                map_sqlx_error("update payment method", e)
            }
        })?;
        row.ok_or_else(|| DomainError::not_found("payment method not found"))?
            .try_into()
    }

    async fn delete_payment_method(&self, id: RefId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete payment method", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("payment method not found"));
        }
        Ok(())
    }

    async fn create_category(&self, name: String) -> DomainResult<Category> {
        let category = Category::new(name)?;
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict("category name already exists")
                } else {
                    map_sqlx_error("create category", e)
                }
            })?;
        Ok(category)
    }

    async fn list_categories(&self) -> DomainResult<Vec<Category>> {
        let rows: Vec<NamedRow> = sqlx::query_as("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list categories", e))?;
        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: RefId::from_uuid(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn get_category(&self, id: RefId) -> DomainResult<Category> {
        let row: Option<NamedRow> =
            sqlx::query_as("SELECT id, name FROM categories WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get category", e))?;
        row.map(|r| Category {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("category not found"))
    }

    async fn update_category(&self, id: RefId, name: String) -> DomainResult<Category> {
        let replacement = Category::new(name)?;
        let row: Option<NamedRow> =
            sqlx::query_as("UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name")
                .bind(id.as_uuid())
                .bind(&replacement.name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        DomainError::conflict("category name already exists")
                    } else {
                        map_sqlx_error("update category", e)
                    }
                })?;
        row.map(|r| Category {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("category not found"))
    }

    async fn delete_category(&self, id: RefId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete category", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("category not found"));
        }
        Ok(())
    }

    async fn create_expense_category(&self, name: String) -> DomainResult<ExpenseCategory> {
        let category = ExpenseCategory::new(name)?;
        sqlx::query("INSERT INTO expense_categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict("expense category name already exists")
                } else {
                    map_sqlx_error("create expense category", e)
                }
            })?;
        Ok(category)
    }

    async fn list_expense_categories(&self) -> DomainResult<Vec<ExpenseCategory>> {
        let rows: Vec<NamedRow> =
            sqlx::query_as("SELECT id, name FROM expense_categories ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list expense categories", e))?;
        Ok(rows
            .into_iter()
            .map(|r| ExpenseCategory {
                id: RefId::from_uuid(r.id),
                name: r.name,
            })
            .collect())
    }

    async fn get_expense_category(&self, id: RefId) -> DomainResult<ExpenseCategory> {
        let row: Option<NamedRow> =
            sqlx::query_as("SELECT id, name FROM expense_categories WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get expense category", e))?;
        row.map(|r| ExpenseCategory {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("expense category not found"))
    }

    async fn update_expense_category(
        &self,
        id: RefId,
        name: String,
    ) -> DomainResult<ExpenseCategory> {
        let replacement = ExpenseCategory::new(name)?;
        let row: Option<NamedRow> = sqlx::query_as(
            "UPDATE expense_categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id.as_uuid())
        .bind(&replacement.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("expense category name already exists")
            } else {
                map_sqlx_error("update expense category", e)
            }
        })?;
        row.map(|r| ExpenseCategory {
            id: RefId::from_uuid(r.id),
            name: r.name,
        })
        .ok_or_else(|| DomainError::not_found("expense category not found"))
    }

    async fn delete_expense_category(&self, id: RefId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM expense_categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete expense category", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("expense category not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn append_audit(&self, record: AuditRecord) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, user_id, action, details, timestamp) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.map(|u| u.as_uuid()))
        .bind(&record.action)
        .bind(&record.details)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append audit", e))?;
        Ok(())
    }

    async fn list_audit_logs(&self) -> DomainResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT id, user_id, action, details, timestamp FROM audit_log \
             ORDER BY timestamp DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list audit logs", e))?;
        Ok(rows.into_iter().map(AuditRecord::from).collect())
    }
}
