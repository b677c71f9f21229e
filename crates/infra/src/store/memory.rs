//! In-memory store backend.
//!
//! Intended for dev and tests. One process-wide lock serializes writes,
//! which gives every multi-step operation the same atomicity the Postgres
//! backend gets from transactions: all checks run before the first
//! mutation, so a failed operation leaves no trace.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use freightdesk_accounting::{
    month_window, Asset, AssetCategory, AssetDetails, CompanyInfo, CompanyInfoUpdate,
    DashboardStats, Expense, ExpenseCategory, ExpenseDetails, ExpenseScope, ShippingStatusCounts,
    Supplier, SupplierDetails,
};
use freightdesk_audit::AuditRecord;
use freightdesk_auth::Actor;
use freightdesk_billing::{
    Category, Invoice, InvoiceNumber, InvoiceScope, PaymentMethod, PaymentMethodDetails,
    PaymentStatus, ShippingStatus, ShippingType,
};
use freightdesk_core::{
    AssetId, ClientId, DomainError, DomainResult, ExpenseId, InvoiceId, ManifestId, OfficeId,
    RefId, SupplierId, UserId, VehicleId,
};
use freightdesk_directory::{Client, ClientDetails, ClientKey, Office, OfficeDetails};
use freightdesk_fleet::{
    verify_dispatch_set, Manifest, ManifestDetails, Vehicle, VehicleDetails,
};

use super::{
    AuditStore, ClientStore, FleetStore, InvoiceStore, LedgerStore, NewInvoice, OfficeStore,
    SettingsStore, UserStore,
};

#[derive(Debug, Default)]
struct State {
    offices: HashMap<OfficeId, Office>,
    clients: HashMap<ClientId, Client>,
    client_keys: HashMap<ClientKey, ClientId>,
    /// Mirrored actor rows; drivers and `created_by` resolve against these.
    users: HashMap<UserId, Actor>,
    invoices: HashMap<InvoiceId, Invoice>,
    vehicles: HashMap<VehicleId, Vehicle>,
    manifests: HashMap<ManifestId, Manifest>,
    expenses: HashMap<ExpenseId, Expense>,
    suppliers: HashMap<SupplierId, Supplier>,
    asset_categories: HashMap<RefId, AssetCategory>,
    assets: HashMap<AssetId, Asset>,
    shipping_types: HashMap<RefId, ShippingType>,
    payment_methods: HashMap<RefId, PaymentMethod>,
    categories: HashMap<RefId, Category>,
    expense_categories: HashMap<RefId, ExpenseCategory>,
    company_info: Option<CompanyInfo>,
    audit_log: Vec<AuditRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| DomainError::internal("lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| DomainError::internal("lock poisoned"))
    }
}

impl State {
    /// Look up a client by identity key, creating it when absent. An
    /// existing row is reused as-is; its fields are never overwritten.
    fn resolve_or_create_client(&mut self, details: &ClientDetails) -> DomainResult<ClientId> {
        let key = details.key();
        if let Some(id) = self.client_keys.get(&key) {
            return Ok(*id);
        }
        let client = Client::from_details(ClientId::new(), details.clone())?;
        let id = client.id;
        self.client_keys.insert(key, id);
        self.clients.insert(id, client);
        Ok(id)
    }

    fn office_name_taken(&self, name: &str, except: Option<OfficeId>) -> bool {
        self.offices
            .values()
            .any(|o| Some(o.id()) != except && o.name() == name.trim())
    }

    fn plate_taken(&self, plate: &str, except: Option<VehicleId>) -> bool {
        self.vehicles
            .values()
            .any(|v| Some(v.id) != except && v.license_plate == plate.trim())
    }

    fn manifest_number_taken(&self, number: &str) -> bool {
        self.manifests
            .values()
            .any(|m| m.manifest_number() == number.trim())
    }
}

#[async_trait]
impl OfficeStore for MemoryStore {
    async fn create_office(&self, details: OfficeDetails) -> DomainResult<Office> {
        details.validate()?;
        let mut state = self.write()?;
        if state.office_name_taken(&details.name, None) {
            return Err(DomainError::conflict("office name already exists"));
        }
        let office = Office::new(OfficeId::new(), details)?;
        state.offices.insert(office.id(), office.clone());
        Ok(office)
    }

    async fn list_offices(&self) -> DomainResult<Vec<Office>> {
        let state = self.read()?;
        let mut offices: Vec<Office> = state.offices.values().cloned().collect();
        offices.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(offices)
    }

    async fn get_office(&self, id: OfficeId) -> DomainResult<Office> {
        let state = self.read()?;
        state
            .offices
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("office not found"))
    }

    async fn update_office(&self, id: OfficeId, details: OfficeDetails) -> DomainResult<Office> {
        details.validate()?;
        let mut state = self.write()?;
        if state.office_name_taken(&details.name, Some(id)) {
            return Err(DomainError::conflict("office name already exists"));
        }
        let office = state
            .offices
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("office not found"))?;
        office.update(details)?;
        Ok(office.clone())
    }

    async fn delete_office(&self, id: OfficeId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.offices.contains_key(&id) {
            return Err(DomainError::not_found("office not found"));
        }
        let referenced = state
            .invoices
            .values()
            .any(|i| i.origin_office_id == id || i.destination_office_id == id)
            || state.expenses.values().any(|e| e.office_id == id);
        if referenced {
            return Err(DomainError::conflict(
                "office is referenced by invoices or expenses",
            ));
        }
        for asset in state.assets.values_mut() {
            if asset.office_id == Some(id) {
                asset.office_id = None;
            }
        }
        state.offices.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn create_client(&self, details: ClientDetails) -> DomainResult<Client> {
        details.validate()?;
        let mut state = self.write()?;
        if state.client_keys.contains_key(&details.key()) {
            return Err(DomainError::conflict("client identity already exists"));
        }
        let client = Client::from_details(ClientId::new(), details)?;
        state.client_keys.insert(client.key(), client.id);
        state.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn list_clients(&self) -> DomainResult<Vec<Client>> {
        let state = self.read()?;
        let mut clients: Vec<Client> = state.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id_number.cmp(&b.id_number)));
        Ok(clients)
    }

    async fn get_client(&self, id: ClientId) -> DomainResult<Client> {
        let state = self.read()?;
        state
            .clients
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("client not found"))
    }

    async fn update_client(&self, id: ClientId, details: ClientDetails) -> DomainResult<Client> {
        details.validate()?;
        let mut state = self.write()?;
        let new_key = details.key();
        if state.client_keys.get(&new_key).is_some_and(|held| *held != id) {
            return Err(DomainError::conflict("client identity already exists"));
        }
        let current = state
            .clients
            .get(&id)
            .ok_or_else(|| DomainError::not_found("client not found"))?;
        let old_key = current.key();
        let updated = Client::from_details(id, details)?;
        state.client_keys.remove(&old_key);
        state.client_keys.insert(new_key, id);
        state.clients.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_client(&self, id: ClientId) -> DomainResult<()> {
        let mut state = self.write()?;
        let Some(client) = state.clients.get(&id) else {
            return Err(DomainError::not_found("client not found"));
        };
        let referenced = state
            .invoices
            .values()
            .any(|i| i.sender_id == id || i.recipient_id == id);
        if referenced {
            return Err(DomainError::conflict("client is referenced by invoices"));
        }
        let key = client.key();
        state.client_keys.remove(&key);
        state.clients.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn sync_user(&self, actor: &Actor) -> DomainResult<()> {
        let mut state = self.write()?;
        state.users.insert(actor.user_id, actor.clone());
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn issue_invoice(
        &self,
        user_id: UserId,
        office_id: OfficeId,
        new: NewInvoice,
    ) -> DomainResult<Invoice> {
        new.sender.validate()?;
        new.recipient.validate()?;
        new.draft.validate()?;

        let mut state = self.write()?;

        // Referenced records must all exist before anything is written.
        if !state.offices.contains_key(&office_id) {
            return Err(DomainError::not_found("office not found"));
        }
        if !state
            .offices
            .contains_key(&new.draft.destination_office_id)
        {
            return Err(DomainError::not_found("destination office not found"));
        }
        if let Some(st) = new.draft.shipping_type_id {
            if !state.shipping_types.contains_key(&st) {
                return Err(DomainError::not_found("shipping type not found"));
            }
        }
        if let Some(pm) = new.draft.payment_method_id {
            if !state.payment_methods.contains_key(&pm) {
                return Err(DomainError::not_found("payment method not found"));
            }
        }
        for item in &new.draft.items {
            if let Some(cat) = item.category_id {
                if !state.categories.contains_key(&cat) {
                    return Err(DomainError::not_found("category not found"));
                }
            }
        }

        // Two offices can share a prefix letter; the composed number must
        // still be globally unique, and a collision must not advance the
        // counter or leave clients behind.
        let office = state
            .offices
            .get(&office_id)
            .ok_or_else(|| DomainError::internal("office row vanished"))?;
        let number =
            InvoiceNumber::compose(office.prefix_letter(), office.next_invoice_number());
        if state.invoices.values().any(|i| i.invoice_number == number) {
            return Err(DomainError::conflict("invoice number already exists"));
        }

        let sender_id = state.resolve_or_create_client(&new.sender)?;
        let recipient_id = state.resolve_or_create_client(&new.recipient)?;

        let office = state
            .offices
            .get_mut(&office_id)
            .ok_or_else(|| DomainError::internal("office row vanished"))?;
        let (sequence, prefix) = office.allocate_invoice_number();
        let number = InvoiceNumber::compose(prefix, sequence);

        let invoice = Invoice::issue(
            number,
            sender_id,
            recipient_id,
            office_id,
            user_id,
            Utc::now(),
            &new.draft,
        )?;
        state.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn list_invoices(&self, scope: &InvoiceScope) -> DomainResult<Vec<Invoice>> {
        let state = self.read()?;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| scope.permits(i.origin_office_id, i.created_by))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.invoice_number.as_str().cmp(a.invoice_number.as_str()))
        });
        Ok(invoices)
    }

    async fn get_invoice(&self, id: InvoiceId, scope: &InvoiceScope) -> DomainResult<Invoice> {
        let state = self.read()?;
        state
            .invoices
            .get(&id)
            .filter(|i| scope.permits(i.origin_office_id, i.created_by))
            .cloned()
            .ok_or_else(|| DomainError::not_found("invoice not found"))
    }

    async fn set_invoice_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
        scope: &InvoiceScope,
    ) -> DomainResult<Invoice> {
        let mut state = self.write()?;
        let invoice = state
            .invoices
            .get_mut(&id)
            .filter(|i| scope.permits(i.origin_office_id, i.created_by))
            .ok_or_else(|| DomainError::not_found("invoice not found"))?;
        invoice.set_payment_status(status);
        Ok(invoice.clone())
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn create_vehicle(&self, details: VehicleDetails) -> DomainResult<Vehicle> {
        details.validate()?;
        let mut state = self.write()?;
        if state.plate_taken(&details.license_plate, None) {
            return Err(DomainError::conflict("license plate already exists"));
        }
        let vehicle = Vehicle::from_details(details)?;
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>> {
        let state = self.read()?;
        let mut vehicles: Vec<Vehicle> = state.vehicles.values().cloned().collect();
        vehicles.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(vehicles)
    }

    async fn get_vehicle(&self, id: VehicleId) -> DomainResult<Vehicle> {
        let state = self.read()?;
        state
            .vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("vehicle not found"))
    }

    async fn update_vehicle(
        &self,
        id: VehicleId,
        details: VehicleDetails,
    ) -> DomainResult<Vehicle> {
        details.validate()?;
        let mut state = self.write()?;
        if state.plate_taken(&details.license_plate, Some(id)) {
            return Err(DomainError::conflict("license plate already exists"));
        }
        let vehicle = state
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("vehicle not found"))?;
        vehicle.update(details)?;
        Ok(vehicle.clone())
    }

    async fn delete_vehicle(&self, id: VehicleId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.vehicles.contains_key(&id) {
            return Err(DomainError::not_found("vehicle not found"));
        }
        if state.manifests.values().any(|m| m.vehicle_id() == id) {
            return Err(DomainError::conflict("vehicle is referenced by manifests"));
        }
        state.vehicles.remove(&id);
        Ok(())
    }

    async fn create_manifest(&self, details: ManifestDetails) -> DomainResult<Manifest> {
        details.validate()?;
        let mut state = self.write()?;
        if !state.vehicles.contains_key(&details.vehicle_id) {
            return Err(DomainError::not_found("vehicle not found"));
        }
        if let Some(driver) = details.driver_id {
            if !state.users.contains_key(&driver) {
                return Err(DomainError::not_found("driver not found"));
            }
        }
        if state.manifest_number_taken(&details.manifest_number) {
            return Err(DomainError::conflict("manifest number already exists"));
        }
        let manifest = Manifest::new(details)?;
        state.manifests.insert(manifest.id(), manifest.clone());
        Ok(manifest)
    }

    async fn list_manifests(&self) -> DomainResult<Vec<Manifest>> {
        let state = self.read()?;
        let mut manifests: Vec<Manifest> = state.manifests.values().cloned().collect();
        manifests.sort_by(|a, b| a.manifest_number().cmp(b.manifest_number()));
        Ok(manifests)
    }

    async fn get_manifest(&self, id: ManifestId) -> DomainResult<(Manifest, Vec<Invoice>)> {
        let state = self.read()?;
        let manifest = state
            .manifests
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("manifest not found"))?;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| i.manifest_id == Some(id))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.invoice_number.as_str().cmp(b.invoice_number.as_str()));
        Ok((manifest, invoices))
    }

    async fn dispatch_manifest(
        &self,
        id: ManifestId,
        invoice_ids: &[InvoiceId],
        driver_id: Option<UserId>,
    ) -> DomainResult<Manifest> {
        let mut state = self.write()?;

        let mut manifest = state
            .manifests
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("manifest not found"))?;
        let mut vehicle = state
            .vehicles
            .get(&manifest.vehicle_id())
            .cloned()
            .ok_or_else(|| DomainError::not_found("vehicle not found"))?;

        // Transitions run on working copies; state is only written back
        // once every check has passed.
        manifest.dispatch(&mut vehicle, driver_id, Utc::now())?;

        if let Some(driver) = driver_id {
            if !state.users.contains_key(&driver) {
                return Err(DomainError::not_found("driver not found"));
            }
        }

        let matched: HashSet<InvoiceId> = invoice_ids
            .iter()
            .filter(|iid| {
                state
                    .invoices
                    .get(iid)
                    .is_some_and(Invoice::is_pending_dispatch)
            })
            .copied()
            .collect();
        verify_dispatch_set(invoice_ids.len(), matched.len())?;

        for iid in &matched {
            if let Some(invoice) = state.invoices.get_mut(iid) {
                invoice.dispatch_to(id)?;
            }
        }
        state.vehicles.insert(vehicle.id, vehicle);
        state.manifests.insert(id, manifest.clone());
        Ok(manifest)
    }

    async fn finalize_trip(&self, id: ManifestId) -> DomainResult<Manifest> {
        let mut state = self.write()?;

        let mut manifest = state
            .manifests
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("manifest not found"))?;
        let mut vehicle = state
            .vehicles
            .get(&manifest.vehicle_id())
            .cloned()
            .ok_or_else(|| DomainError::not_found("vehicle not found"))?;

        manifest.finalize_trip(&mut vehicle, Utc::now())?;

        for invoice in state.invoices.values_mut() {
            if invoice.manifest_id == Some(id) {
                invoice.mark_delivered();
            }
        }
        state.vehicles.insert(vehicle.id, vehicle);
        state.manifests.insert(id, manifest.clone());
        Ok(manifest)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn record_expense(
        &self,
        details: ExpenseDetails,
        office_id: OfficeId,
        created_by: UserId,
    ) -> DomainResult<Expense> {
        details.validate()?;
        let mut state = self.write()?;
        if !state.offices.contains_key(&office_id) {
            return Err(DomainError::not_found("office not found"));
        }
        let expense = Expense::record(details, office_id, created_by, Utc::now())?;
        state.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn list_expenses(&self, scope: &ExpenseScope) -> DomainResult<Vec<Expense>> {
        let state = self.read()?;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| scope.permits(e.office_id))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    async fn create_supplier(&self, details: SupplierDetails) -> DomainResult<Supplier> {
        details.validate()?;
        let mut state = self.write()?;
        if state.suppliers.values().any(|s| s.name == details.name) {
            return Err(DomainError::conflict("supplier name already exists"));
        }
        let supplier = Supplier::from_details(details)?;
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn list_suppliers(&self) -> DomainResult<Vec<Supplier>> {
        let state = self.read()?;
        let mut suppliers: Vec<Supplier> = state.suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn get_supplier(&self, id: SupplierId) -> DomainResult<Supplier> {
        let state = self.read()?;
        state
            .suppliers
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("supplier not found"))
    }

    async fn update_supplier(
        &self,
        id: SupplierId,
        details: SupplierDetails,
    ) -> DomainResult<Supplier> {
        details.validate()?;
        let mut state = self.write()?;
        if state
            .suppliers
            .values()
            .any(|s| s.id != id && s.name == details.name)
        {
            return Err(DomainError::conflict("supplier name already exists"));
        }
        let supplier = state
            .suppliers
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("supplier not found"))?;
        supplier.update(details)?;
        Ok(supplier.clone())
    }

    async fn delete_supplier(&self, id: SupplierId) -> DomainResult<()> {
        let mut state = self.write()?;
        state
            .suppliers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("supplier not found"))
    }

    async fn create_asset_category(&self, name: String) -> DomainResult<AssetCategory> {
        let mut state = self.write()?;
        if state.asset_categories.values().any(|c| c.name == name) {
            return Err(DomainError::conflict("asset category name already exists"));
        }
        let category = AssetCategory::new(name)?;
        state.asset_categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_asset_categories(&self) -> DomainResult<Vec<AssetCategory>> {
        let state = self.read()?;
        let mut categories: Vec<AssetCategory> =
            state.asset_categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_asset_category(&self, id: RefId) -> DomainResult<AssetCategory> {
        let state = self.read()?;
        state
            .asset_categories
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("asset category not found"))
    }

    async fn update_asset_category(&self, id: RefId, name: String) -> DomainResult<AssetCategory> {
        let mut state = self.write()?;
        if state
            .asset_categories
            .values()
            .any(|c| c.id != id && c.name == name)
        {
            return Err(DomainError::conflict("asset category name already exists"));
        }
        let replacement = AssetCategory::new(name)?;
        let category = state
            .asset_categories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("asset category not found"))?;
        category.name = replacement.name;
        Ok(category.clone())
    }

    async fn delete_asset_category(&self, id: RefId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.asset_categories.contains_key(&id) {
            return Err(DomainError::not_found("asset category not found"));
        }
        if state.assets.values().any(|a| a.category_id == Some(id)) {
            return Err(DomainError::conflict("asset category is in use"));
        }
        state.asset_categories.remove(&id);
        Ok(())
    }

    async fn create_asset(&self, details: AssetDetails) -> DomainResult<Asset> {
        details.validate()?;
        let mut state = self.write()?;
        if let Some(cat) = details.category_id {
            if !state.asset_categories.contains_key(&cat) {
                return Err(DomainError::not_found("asset category not found"));
            }
        }
        if let Some(office) = details.office_id {
            if !state.offices.contains_key(&office) {
                return Err(DomainError::not_found("office not found"));
            }
        }
        let asset = Asset::from_details(details)?;
        state.assets.insert(asset.id, asset.clone());
        Ok(asset)
    }

    async fn list_assets(&self) -> DomainResult<Vec<Asset>> {
        let state = self.read()?;
        let mut assets: Vec<Asset> = state.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(assets)
    }

    async fn get_asset(&self, id: AssetId) -> DomainResult<Asset> {
        let state = self.read()?;
        state
            .assets
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("asset not found"))
    }

    async fn update_asset(&self, id: AssetId, details: AssetDetails) -> DomainResult<Asset> {
        details.validate()?;
        let mut state = self.write()?;
        if let Some(cat) = details.category_id {
            if !state.asset_categories.contains_key(&cat) {
                return Err(DomainError::not_found("asset category not found"));
            }
        }
        if let Some(office) = details.office_id {
            if !state.offices.contains_key(&office) {
                return Err(DomainError::not_found("office not found"));
            }
        }
        let asset = state
            .assets
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("asset not found"))?;
        asset.update(details)?;
        Ok(asset.clone())
    }

    async fn delete_asset(&self, id: AssetId) -> DomainResult<()> {
        let mut state = self.write()?;
        state
            .assets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("asset not found"))
    }

    async fn company_info(&self) -> DomainResult<CompanyInfo> {
        let state = self.read()?;
        Ok(state.company_info.clone().unwrap_or_default())
    }

    async fn update_company_info(&self, update: CompanyInfoUpdate) -> DomainResult<CompanyInfo> {
        let mut state = self.write()?;
        let mut info = state.company_info.clone().unwrap_or_default();
        info.apply(update);
        state.company_info = Some(info.clone());
        Ok(info)
    }

    async fn dashboard_stats(&self, now: DateTime<Utc>) -> DomainResult<DashboardStats> {
        let state = self.read()?;
        let (start, end) = month_window(now);

        let revenue: Decimal = state
            .invoices
            .values()
            .filter(|i| {
                i.created_at >= start
                    && i.created_at < end
                    && i.payment_status != PaymentStatus::Voided
            })
            .map(|i| i.total)
            .sum();
        let expenses: Decimal = state
            .expenses
            .values()
            .filter(|e| e.created_at >= start && e.created_at < end)
            .map(|e| e.amount)
            .sum();

        let mut counts = ShippingStatusCounts::default();
        for invoice in state.invoices.values() {
            match invoice.shipping_status {
                ShippingStatus::PendingDispatch => counts.pending_dispatch += 1,
                ShippingStatus::InTransit => counts.in_transit += 1,
                ShippingStatus::Delivered => counts.delivered += 1,
                ShippingStatus::Returned => counts.returned += 1,
            }
        }

        Ok(DashboardStats::from_totals(revenue, expenses, counts))
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn create_shipping_type(&self, name: String) -> DomainResult<ShippingType> {
        let mut state = self.write()?;
        if state.shipping_types.values().any(|t| t.name == name) {
            return Err(DomainError::conflict("shipping type name already exists"));
        }
        let entry = ShippingType::new(name)?;
        state.shipping_types.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_shipping_types(&self) -> DomainResult<Vec<ShippingType>> {
        let state = self.read()?;
        let mut entries: Vec<ShippingType> = state.shipping_types.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_shipping_type(&self, id: RefId) -> DomainResult<ShippingType> {
        let state = self.read()?;
        state
            .shipping_types
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("shipping type not found"))
    }

    async fn update_shipping_type(&self, id: RefId, name: String) -> DomainResult<ShippingType> {
        let mut state = self.write()?;
        if state
            .shipping_types
            .values()
            .any(|t| t.id != id && t.name == name)
        {
            return Err(DomainError::conflict("shipping type name already exists"));
        }
        let replacement = ShippingType::new(name)?;
        let entry = state
            .shipping_types
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("shipping type not found"))?;
        entry.name = replacement.name;
        Ok(entry.clone())
    }

    async fn delete_shipping_type(&self, id: RefId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.shipping_types.contains_key(&id) {
            return Err(DomainError::not_found("shipping type not found"));
        }
        if state
            .invoices
            .values()
            .any(|i| i.shipping_type_id == Some(id))
        {
            return Err(DomainError::conflict("shipping type is in use"));
        }
        state.shipping_types.remove(&id);
        Ok(())
    }

    async fn create_payment_method(
        &self,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod> {
        details.validate()?;
        let mut state = self.write()?;
        if state.payment_methods.values().any(|m| m.name == details.name) {
            return Err(DomainError::conflict("payment method name already exists"));
        }
        let method = PaymentMethod::from_details(details)?;
        state.payment_methods.insert(method.id, method.clone());
        Ok(method)
    }

    async fn list_payment_methods(&self) -> DomainResult<Vec<PaymentMethod>> {
        let state = self.read()?;
        let mut methods: Vec<PaymentMethod> = state.payment_methods.values().cloned().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(methods)
    }

    async fn get_payment_method(&self, id: RefId) -> DomainResult<PaymentMethod> {
        let state = self.read()?;
        state
            .payment_methods
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("payment method not found"))
    }

    async fn update_payment_method(
        &self,
        id: RefId,
        details: PaymentMethodDetails,
    ) -> DomainResult<PaymentMethod> {
        details.validate()?;
        let mut state = self.write()?;
        if state
            .payment_methods
            .values()
            .any(|m| m.id != id && m.name == details.name)
        {
            return Err(DomainError::conflict("payment method name already exists"));
        }
        if !state.payment_methods.contains_key(&id) {
            return Err(DomainError::not_found("payment method not found"));
        }
        let mut method = PaymentMethod::from_details(details)?;
        method.id = id;
        state.payment_methods.insert(id, method.clone());
        Ok(method)
    }

    async fn delete_payment_method(&self, id: RefId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.payment_methods.contains_key(&id) {
            return Err(DomainError::not_found("payment method not found"));
        }
        if state
            .invoices
            .values()
            .any(|i| i.payment_method_id == Some(id))
        {
            return Err(DomainError::conflict("payment method is in use"));
        }
        state.payment_methods.remove(&id);
        Ok(())
    }

    async fn create_category(&self, name: String) -> DomainResult<Category> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.name == name) {
            return Err(DomainError::conflict("category name already exists"));
        }
        let category = Category::new(name)?;
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> DomainResult<Vec<Category>> {
        let state = self.read()?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: RefId) -> DomainResult<Category> {
        let state = self.read()?;
        state
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("category not found"))
    }

    async fn update_category(&self, id: RefId, name: String) -> DomainResult<Category> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.id != id && c.name == name) {
            return Err(DomainError::conflict("category name already exists"));
        }
        let replacement = Category::new(name)?;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("category not found"))?;
        category.name = replacement.name;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: RefId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.categories.contains_key(&id) {
            return Err(DomainError::not_found("category not found"));
        }
        let in_use = state
            .invoices
            .values()
            .flat_map(|i| i.items.iter())
            .any(|item| item.category_id == Some(id));
        if in_use {
            return Err(DomainError::conflict("category is in use"));
        }
        state.categories.remove(&id);
        Ok(())
    }

    async fn create_expense_category(&self, name: String) -> DomainResult<ExpenseCategory> {
        let mut state = self.write()?;
        if state.expense_categories.values().any(|c| c.name == name) {
            return Err(DomainError::conflict("expense category name already exists"));
        }
        let category = ExpenseCategory::new(name)?;
        state
            .expense_categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_expense_categories(&self) -> DomainResult<Vec<ExpenseCategory>> {
        let state = self.read()?;
        let mut categories: Vec<ExpenseCategory> =
            state.expense_categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_expense_category(&self, id: RefId) -> DomainResult<ExpenseCategory> {
        let state = self.read()?;
        state
            .expense_categories
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("expense category not found"))
    }

    async fn update_expense_category(
        &self,
        id: RefId,
        name: String,
    ) -> DomainResult<ExpenseCategory> {
        let mut state = self.write()?;
        if state
            .expense_categories
            .values()
            .any(|c| c.id != id && c.name == name)
        {
            return Err(DomainError::conflict("expense category name already exists"));
        }
        let replacement = ExpenseCategory::new(name)?;
        let category = state
            .expense_categories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("expense category not found"))?;
        category.name = replacement.name;
        Ok(category.clone())
    }

    async fn delete_expense_category(&self, id: RefId) -> DomainResult<()> {
        let mut state = self.write()?;
        state
            .expense_categories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("expense category not found"))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, record: AuditRecord) -> DomainResult<()> {
        let mut state = self.write()?;
        state.audit_log.push(record);
        Ok(())
    }

    async fn list_audit_logs(&self) -> DomainResult<Vec<AuditRecord>> {
        let state = self.read()?;
        Ok(state.audit_log.iter().rev().cloned().collect())
    }
}
