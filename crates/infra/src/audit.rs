//! Audit sink persisting into the backing store.

use std::sync::Arc;

use async_trait::async_trait;

use freightdesk_audit::{AuditRecord, AuditSink};

use crate::store::Store;

/// Writes audit records through the store's audit table. Failures are
/// logged and swallowed so the workflow that emitted the record never
/// rolls back on audit trouble.
pub struct StoreAuditSink {
    store: Arc<dyn Store>,
}

impl StoreAuditSink {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(&self, record: AuditRecord) {
        if let Err(err) = self.store.append_audit(record).await {
            tracing::warn!(error = %err, "audit record was not persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use freightdesk_core::UserId;
    use rust_decimal_macros::dec;

    use crate::store::{AuditStore, MemoryStore};

    use super::*;

    #[tokio::test]
    async fn records_flow_into_the_store() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreAuditSink::new(store.clone());

        sink.record(AuditRecord::invoice_issued(UserId::new(), "A-000001", dec!(10)))
            .await;

        let logs = store.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Invoice issued");
    }
}
