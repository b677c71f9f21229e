use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, RefId};

fn validate_label(label: &str, what: &str) -> DomainResult<()> {
    if label.trim().is_empty() {
        return Err(DomainError::validation(format!("{what} name must not be empty")));
    }
    Ok(())
}

/// Service modality offered to customers (standard, express, and so on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingType {
    pub id: RefId,
    pub name: String,
}

impl ShippingType {
    pub fn new(name: String) -> DomainResult<Self> {
        validate_label(&name, "shipping type")?;
        Ok(Self { id: RefId::new(), name })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Cash,
    Transfer,
    MobilePayment,
    Credit,
    Other,
}

/// A way customers can pay, with the bank coordinates shown on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: RefId,
    pub name: String,
    pub kind: PaymentMethodKind,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub beneficiary_name: String,
    #[serde(default)]
    pub beneficiary_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Payload for creating or replacing a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodDetails {
    pub name: String,
    pub kind: PaymentMethodKind,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub beneficiary_name: String,
    #[serde(default)]
    pub beneficiary_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl PaymentMethodDetails {
    pub fn validate(&self) -> DomainResult<()> {
        validate_label(&self.name, "payment method")
    }
}

impl PaymentMethod {
    pub fn from_details(details: PaymentMethodDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: RefId::new(),
            name: details.name,
            kind: details.kind,
            bank_name: details.bank_name,
            account_number: details.account_number,
            beneficiary_name: details.beneficiary_name,
            beneficiary_id: details.beneficiary_id,
            phone: details.phone,
            email: details.email,
        })
    }
}

/// Merchandise category, referenced by invoice items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RefId,
    pub name: String,
}

impl Category {
    pub fn new(name: String) -> DomainResult<Self> {
        validate_label(&name, "category")?;
        Ok(Self { id: RefId::new(), name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reference_names_are_rejected() {
        assert!(ShippingType::new("  ".to_string()).is_err());
        assert!(Category::new(String::new()).is_err());
        assert!(
            PaymentMethodDetails {
                name: String::new(),
                kind: PaymentMethodKind::Cash,
                bank_name: String::new(),
                account_number: String::new(),
                beneficiary_name: String::new(),
                beneficiary_id: String::new(),
                phone: String::new(),
                email: String::new(),
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn payment_method_keeps_bank_coordinates() {
        let method = PaymentMethod::from_details(PaymentMethodDetails {
            name: "Pago Movil BDV".to_string(),
            kind: PaymentMethodKind::MobilePayment,
            bank_name: "Banco de Venezuela".to_string(),
            account_number: String::new(),
            beneficiary_name: "Transporte Alianza C.A.".to_string(),
            beneficiary_id: "J-12345678-9".to_string(),
            phone: "0412-5551234".to_string(),
            email: String::new(),
        })
        .unwrap();
        assert_eq!(method.kind, PaymentMethodKind::MobilePayment);
        assert_eq!(method.bank_name, "Banco de Venezuela");
    }
}
