use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightdesk_core::{
    ClientId, DomainError, DomainResult, InvoiceId, ItemId, ManifestId, OfficeId, RefId, UserId,
};

use crate::number::InvoiceNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    PendingDispatch,
    InTransit,
    Delivered,
    Returned,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::PendingDispatch => "pending_dispatch",
            ShippingStatus::InTransit => "in_transit",
            ShippingStatus::Delivered => "delivered",
            ShippingStatus::Returned => "returned",
        }
    }
}

/// Who pays the freight: the sender up front or the recipient on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    FreightPrepaid,
    FreightCollect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ves,
    Usd,
}

/// One line of merchandise on an invoice. Owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchandiseItem {
    pub id: ItemId,
    pub quantity: u32,
    pub description: String,
    /// Kilograms, strictly positive.
    pub weight: Decimal,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub category_id: Option<RefId>,
}

/// Item payload as submitted at issuance, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub quantity: u32,
    pub description: String,
    pub weight: Decimal,
    #[serde(default)]
    pub length: Decimal,
    #[serde(default)]
    pub width: Decimal,
    #[serde(default)]
    pub height: Decimal,
    #[serde(default)]
    pub category_id: Option<RefId>,
}

impl ItemDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("item quantity must be at least 1"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("item description must not be empty"));
        }
        if self.weight <= Decimal::ZERO {
            return Err(DomainError::validation("item weight must be greater than zero"));
        }
        for (label, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if value < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "item {label} must not be negative"
                )));
            }
        }
        Ok(())
    }

    fn materialize(&self) -> MerchandiseItem {
        MerchandiseItem {
            id: ItemId::new(),
            quantity: self.quantity,
            description: self.description.clone(),
            weight: self.weight,
            length: self.length,
            width: self.width,
            height: self.height,
            category_id: self.category_id,
        }
    }
}

/// Invoice payload as submitted at issuance. Sender and recipient travel
/// separately as client payloads; financial amounts are recorded as
/// submitted, never recomputed server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub destination_office_id: OfficeId,
    #[serde(default)]
    pub shipping_type_id: Option<RefId>,
    #[serde(default)]
    pub payment_method_id: Option<RefId>,
    pub payment_type: PaymentType,
    pub payment_currency: Currency,
    #[serde(default)]
    pub has_insurance: bool,
    #[serde(default)]
    pub declared_value: Decimal,
    #[serde(default)]
    pub insurance_percentage: Decimal,
    #[serde(default)]
    pub has_discount: bool,
    #[serde(default)]
    pub discount_percentage: Decimal,
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub ipostel: Decimal,
    #[serde(default)]
    pub igtf: Decimal,
    pub total: Decimal,
    pub items: Vec<ItemDraft>,
}

impl InvoiceDraft {
    pub fn validate(&self) -> DomainResult<()> {
        for (label, value) in [
            ("subtotal", self.subtotal),
            ("tax", self.tax),
            ("ipostel", self.ipostel),
            ("igtf", self.igtf),
            ("total", self.total),
            ("declared_value", self.declared_value),
            ("insurance_percentage", self.insurance_percentage),
            ("discount_percentage", self.discount_percentage),
        ] {
            if value < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "{label} must not be negative"
                )));
            }
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

/// A freight invoice. Issued once with an office-scoped sequential number,
/// then moved along the shipping lifecycle by manifest transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: InvoiceNumber,
    pub sender_id: ClientId,
    pub recipient_id: ClientId,
    pub origin_office_id: OfficeId,
    pub destination_office_id: OfficeId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub shipping_type_id: Option<RefId>,
    pub payment_method_id: Option<RefId>,
    pub payment_type: PaymentType,
    pub payment_currency: Currency,
    pub has_insurance: bool,
    pub declared_value: Decimal,
    pub insurance_percentage: Decimal,
    pub has_discount: bool,
    pub discount_percentage: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub ipostel: Decimal,
    pub igtf: Decimal,
    pub total: Decimal,
    pub manifest_id: Option<ManifestId>,
    pub items: Vec<MerchandiseItem>,
}

impl Invoice {
    /// Builds the persisted invoice from a validated draft. The caller owns
    /// number allocation and transactionality; this only shapes the record.
    pub fn issue(
        invoice_number: InvoiceNumber,
        sender_id: ClientId,
        recipient_id: ClientId,
        origin_office_id: OfficeId,
        created_by: UserId,
        created_at: DateTime<Utc>,
        draft: &InvoiceDraft,
    ) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: InvoiceId::new(),
            invoice_number,
            sender_id,
            recipient_id,
            origin_office_id,
            destination_office_id: draft.destination_office_id,
            created_by,
            created_at,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::PendingDispatch,
            shipping_type_id: draft.shipping_type_id,
            payment_method_id: draft.payment_method_id,
            payment_type: draft.payment_type,
            payment_currency: draft.payment_currency,
            has_insurance: draft.has_insurance,
            declared_value: draft.declared_value,
            insurance_percentage: draft.insurance_percentage,
            has_discount: draft.has_discount,
            discount_percentage: draft.discount_percentage,
            subtotal: draft.subtotal,
            tax: draft.tax,
            ipostel: draft.ipostel,
            igtf: draft.igtf,
            total: draft.total,
            manifest_id: None,
            items: draft.items.iter().map(ItemDraft::materialize).collect(),
        })
    }

    pub fn is_pending_dispatch(&self) -> bool {
        self.shipping_status == ShippingStatus::PendingDispatch
    }

    /// Puts the invoice on a departing manifest.
    pub fn dispatch_to(&mut self, manifest_id: ManifestId) -> DomainResult<()> {
        if !self.is_pending_dispatch() {
            return Err(DomainError::validation(format!(
                "invoice {} is not pending dispatch",
                self.invoice_number
            )));
        }
        self.shipping_status = ShippingStatus::InTransit;
        self.manifest_id = Some(manifest_id);
        Ok(())
    }

    /// Marks the shipment delivered when its manifest's trip finishes.
    pub fn mark_delivered(&mut self) {
        self.shipping_status = ShippingStatus::Delivered;
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            destination_office_id: OfficeId::new(),
            shipping_type_id: None,
            payment_method_id: None,
            payment_type: PaymentType::FreightPrepaid,
            payment_currency: Currency::Ves,
            has_insurance: false,
            declared_value: Decimal::ZERO,
            insurance_percentage: Decimal::ZERO,
            has_discount: false,
            discount_percentage: Decimal::ZERO,
            subtotal: dec!(100.00),
            tax: dec!(16.00),
            ipostel: dec!(0.50),
            igtf: Decimal::ZERO,
            total: dec!(116.50),
            items: vec![ItemDraft {
                quantity: 2,
                description: "Caja de repuestos".to_string(),
                weight: dec!(12.5),
                length: Decimal::ZERO,
                width: Decimal::ZERO,
                height: Decimal::ZERO,
                category_id: None,
            }],
        }
    }

    fn issue(draft: &InvoiceDraft) -> Invoice {
        Invoice::issue(
            InvoiceNumber::compose('A', 1),
            ClientId::new(),
            ClientId::new(),
            OfficeId::new(),
            UserId::new(),
            Utc::now(),
            draft,
        )
        .unwrap()
    }

    #[test]
    fn issued_invoice_starts_pending_and_unassigned() {
        let invoice = issue(&draft());
        assert_eq!(invoice.payment_status, PaymentStatus::Pending);
        assert_eq!(invoice.shipping_status, ShippingStatus::PendingDispatch);
        assert_eq!(invoice.manifest_id, None);
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.total, dec!(116.50));
    }

    #[test]
    fn dispatch_links_manifest_and_moves_to_in_transit() {
        let mut invoice = issue(&draft());
        let manifest = ManifestId::new();
        invoice.dispatch_to(manifest).unwrap();
        assert_eq!(invoice.shipping_status, ShippingStatus::InTransit);
        assert_eq!(invoice.manifest_id, Some(manifest));

        invoice.mark_delivered();
        assert_eq!(invoice.shipping_status, ShippingStatus::Delivered);
    }

    #[test]
    fn dispatching_a_non_pending_invoice_is_rejected() {
        let mut invoice = issue(&draft());
        invoice.dispatch_to(ManifestId::new()).unwrap();
        let err = invoice.dispatch_to(ManifestId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_quantity_item_is_rejected() {
        let mut d = draft();
        d.items[0].quantity = 0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn blank_item_description_is_rejected() {
        let mut d = draft();
        d.items[0].description = "   ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn non_positive_item_weight_is_rejected() {
        let mut d = draft();
        d.items[0].weight = Decimal::ZERO;
        assert!(d.validate().is_err());
        d.items[0].weight = dec!(-1);
        assert!(d.validate().is_err());
    }

    #[test]
    fn negative_financials_are_rejected() {
        let mut d = draft();
        d.subtotal = dec!(-0.01);
        assert!(d.validate().is_err());

        let mut d = draft();
        d.igtf = dec!(-3);
        assert!(d.validate().is_err());
    }

    #[test]
    fn an_invoice_may_carry_no_items() {
        let mut d = draft();
        d.items.clear();
        assert!(d.validate().is_ok());
    }

    #[test]
    fn enums_use_snake_case_except_currency() {
        assert_eq!(
            serde_json::to_value(ShippingStatus::PendingDispatch).unwrap(),
            "pending_dispatch"
        );
        assert_eq!(
            serde_json::to_value(PaymentType::FreightCollect).unwrap(),
            "freight_collect"
        );
        assert_eq!(serde_json::to_value(PaymentStatus::Voided).unwrap(), "voided");
        assert_eq!(serde_json::to_value(Currency::Usd).unwrap(), "USD");
    }
}
