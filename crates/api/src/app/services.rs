//! Service wiring: backend selection plus the two workflows that do
//! more than a bare store call (user mirroring and audit events).

use std::sync::Arc;

use freightdesk_accounting::{Expense, ExpenseDetails};
use freightdesk_audit::{AuditRecord, AuditSink};
use freightdesk_auth::Actor;
use freightdesk_billing::Invoice;
use freightdesk_core::{DomainError, DomainResult};
use freightdesk_infra::{MemoryStore, NewInvoice, PgStore, Store, StoreAuditSink};

pub struct AppServices {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditSink>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Issue an invoice on behalf of `actor`, then record the audit
    /// event once the write has committed.
    pub async fn issue_invoice(&self, actor: &Actor, new: NewInvoice) -> DomainResult<Invoice> {
        let office_id = actor
            .office_id
            .ok_or_else(|| DomainError::validation("user has no origin office"))?;

        self.store.sync_user(actor).await?;
        let invoice = self
            .store
            .issue_invoice(actor.user_id, office_id, new)
            .await?;

        self.audit
            .record(AuditRecord::invoice_issued(
                actor.user_id,
                invoice.invoice_number.as_str(),
                invoice.total,
            ))
            .await;

        Ok(invoice)
    }

    /// Record an operating expense against the actor's office.
    pub async fn record_expense(
        &self,
        actor: &Actor,
        details: ExpenseDetails,
    ) -> DomainResult<Expense> {
        let office_id = actor
            .office_id
            .ok_or_else(|| DomainError::validation("user has no office"))?;

        self.store.sync_user(actor).await?;
        let expense = self
            .store
            .record_expense(details, office_id, actor.user_id)
            .await?;

        self.audit
            .record(AuditRecord::expense_recorded(
                actor.user_id,
                &expense.description,
                expense.amount,
            ))
            .await;

        Ok(expense)
    }
}

/// Pick the storage backend from the environment: Postgres when
/// `USE_PERSISTENT_STORES=true` and reachable, in-memory otherwise.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        match build_persistent_services().await {
            Ok(services) => return services,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "persistent store unavailable, falling back to in-memory"
                );
            }
        }
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let audit = Arc::new(StoreAuditSink::new(store.clone()));
    AppServices::new(store, audit)
}

async fn build_persistent_services() -> anyhow::Result<AppServices> {
    let database_url = std::env::var("DATABASE_URL")?;
    let store: Arc<dyn Store> = Arc::new(PgStore::connect(&database_url).await?);
    let audit = Arc::new(StoreAuditSink::new(store.clone()));
    Ok(AppServices::new(store, audit))
}
