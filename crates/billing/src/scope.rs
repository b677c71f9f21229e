use freightdesk_core::{OfficeId, UserId};

/// How far an actor can see into the invoice ledger. Listing and detail
/// reads apply the same filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceScope {
    /// Every invoice, any office.
    All,
    /// Invoices whose origin office matches.
    Office(OfficeId),
    /// Only invoices the actor issued.
    CreatedBy(UserId),
}

impl InvoiceScope {
    pub fn permits(&self, origin_office_id: OfficeId, created_by: UserId) -> bool {
        match self {
            InvoiceScope::All => true,
            InvoiceScope::Office(office) => *office == origin_office_id,
            InvoiceScope::CreatedBy(user) => *user == created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_filter_on_the_expected_column() {
        let office = OfficeId::new();
        let user = UserId::new();

        assert!(InvoiceScope::All.permits(office, user));
        assert!(InvoiceScope::Office(office).permits(office, UserId::new()));
        assert!(!InvoiceScope::Office(office).permits(OfficeId::new(), user));
        assert!(InvoiceScope::CreatedBy(user).permits(OfficeId::new(), user));
        assert!(!InvoiceScope::CreatedBy(user).permits(office, UserId::new()));
    }
}
