//! Audit trail records and the sink boundary.
//!
//! The workflow layer emits a record after a successful commit; sinks are
//! best-effort consumers. A sink failure must never surface to the caller
//! that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightdesk_core::{AuditLogId, UserId};

/// One recorded action: who, what, free-text details, when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(user_id: Option<UserId>, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: AuditLogId::new(),
            user_id,
            action: action.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }

    /// Record emitted after an invoice commits.
    pub fn invoice_issued(user_id: UserId, invoice_number: &str, total: Decimal) -> Self {
        Self::new(
            Some(user_id),
            "Invoice issued",
            format!("Invoice {invoice_number} issued for a total of {total}."),
        )
    }

    /// Record emitted after an expense commits.
    pub fn expense_recorded(user_id: UserId, description: &str, amount: Decimal) -> Self {
        Self::new(
            Some(user_id),
            "Expense recorded",
            format!("Expense '{description}' recorded for an amount of {amount}."),
        )
    }
}

/// Fire-and-forget audit consumer.
///
/// Implementations swallow their own failures (logging them) so the calling
/// workflow never rolls back on audit trouble.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord);
}

/// Sink that drops everything. Useful in unit tests and tools.
#[derive(Debug, Default)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _record: AuditRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn invoice_record_carries_number_and_total() {
        let user = UserId::new();
        let record = AuditRecord::invoice_issued(user, "A-000123", dec!(150.00));
        assert_eq!(record.user_id, Some(user));
        assert_eq!(record.action, "Invoice issued");
        assert!(record.details.contains("A-000123"));
        assert!(record.details.contains("150.00"));
    }

    #[test]
    fn expense_record_carries_description_and_amount() {
        let user = UserId::new();
        let record = AuditRecord::expense_recorded(user, "Fuel", dec!(75.50));
        assert_eq!(record.action, "Expense recorded");
        assert!(record.details.contains("'Fuel'"));
        assert!(record.details.contains("75.50"));
    }
}
