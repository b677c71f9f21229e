use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, ExpenseId, OfficeId, RefId, UserId};

/// Preset label offered when booking expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: RefId,
    pub name: String,
}

impl ExpenseCategory {
    pub fn new(name: String) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("expense category name must not be empty"));
        }
        Ok(Self { id: RefId::new(), name })
    }
}

/// An operating expense booked against a branch office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Decimal,
    /// Free-text category label, e.g. "fuel".
    pub category: String,
    pub office_id: OfficeId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording an expense. The office comes from the actor, not
/// the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
}

impl ExpenseDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("expense description must not be empty"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::validation("expense amount must be greater than zero"));
        }
        Ok(())
    }
}

impl Expense {
    pub fn record(
        details: ExpenseDetails,
        office_id: OfficeId,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: ExpenseId::new(),
            description: details.description,
            amount: details.amount,
            category: details.category,
            office_id,
            created_by,
            created_at,
        })
    }
}

/// How far an actor can see into the expense ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseScope {
    All,
    Office(OfficeId),
}

impl ExpenseScope {
    pub fn permits(&self, office_id: OfficeId) -> bool {
        match self {
            ExpenseScope::All => true,
            ExpenseScope::Office(own) => *own == office_id,
        }
    }
}
