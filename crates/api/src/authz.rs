//! Role-based read scoping and admin gates.

use axum::http::StatusCode;

use freightdesk_accounting::ExpenseScope;
use freightdesk_auth::{Actor, Role};
use freightdesk_billing::InvoiceScope;

use crate::app::errors::json_error;

/// Invoice visibility for an actor.
///
/// Admin tiers see every invoice, office admins their office's traffic,
/// operators only what they issued. An office admin without an assigned
/// office degrades to own-issued.
pub fn invoice_scope(actor: &Actor) -> InvoiceScope {
    match actor.role {
        Role::Superuser | Role::GeneralAdmin => InvoiceScope::All,
        Role::OfficeAdmin => match actor.office_id {
            Some(office_id) => InvoiceScope::Office(office_id),
            None => InvoiceScope::CreatedBy(actor.user_id),
        },
        Role::Operator => InvoiceScope::CreatedBy(actor.user_id),
    }
}

/// Expense ledger visibility. `None` means the actor has no office to
/// scope to and sees an empty ledger.
pub fn expense_scope(actor: &Actor) -> Option<ExpenseScope> {
    if actor.role.is_admin_tier() {
        return Some(ExpenseScope::All);
    }
    actor.office_id.map(ExpenseScope::Office)
}

/// Gate for admin-tier surfaces (audit log, company info updates).
pub fn require_admin_tier(actor: &Actor) -> Result<(), axum::response::Response> {
    if actor.role.is_admin_tier() {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "administrator role required",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use freightdesk_core::{OfficeId, UserId};

    fn actor(role: Role, office_id: Option<OfficeId>) -> Actor {
        Actor {
            user_id: UserId::new(),
            username: "ops".to_string(),
            office_id,
            role,
        }
    }

    #[test]
    fn admin_tiers_see_everything() {
        let a = actor(Role::Superuser, None);
        assert_eq!(invoice_scope(&a), InvoiceScope::All);
        let a = actor(Role::GeneralAdmin, Some(OfficeId::new()));
        assert_eq!(invoice_scope(&a), InvoiceScope::All);
    }

    #[test]
    fn office_admin_scopes_to_office() {
        let office_id = OfficeId::new();
        let a = actor(Role::OfficeAdmin, Some(office_id));
        assert_eq!(invoice_scope(&a), InvoiceScope::Office(office_id));
    }

    #[test]
    fn office_admin_without_office_sees_own() {
        let a = actor(Role::OfficeAdmin, None);
        assert_eq!(invoice_scope(&a), InvoiceScope::CreatedBy(a.user_id));
    }

    #[test]
    fn operator_sees_own_invoices_and_office_expenses() {
        let office_id = OfficeId::new();
        let a = actor(Role::Operator, Some(office_id));
        assert_eq!(invoice_scope(&a), InvoiceScope::CreatedBy(a.user_id));
        assert_eq!(expense_scope(&a), Some(ExpenseScope::Office(office_id)));
    }

    #[test]
    fn operator_without_office_has_no_expense_scope() {
        let a = actor(Role::Operator, None);
        assert_eq!(expense_scope(&a), None);
    }
}
