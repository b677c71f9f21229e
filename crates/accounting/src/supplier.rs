use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, SupplierId};

/// A vendor the company buys from. Bookkeeping data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    /// Tax registry id, e.g. "J-12345678-9".
    #[serde(default)]
    pub rif: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDetails {
    pub name: String,
    #[serde(default)]
    pub rif: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl SupplierDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("supplier name must not be empty"));
        }
        Ok(())
    }
}

impl Supplier {
    pub fn from_details(details: SupplierDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: SupplierId::new(),
            name: details.name,
            rif: details.rif,
            phone: details.phone,
            address: details.address,
        })
    }

    pub fn update(&mut self, details: SupplierDetails) -> DomainResult<()> {
        details.validate()?;
        self.name = details.name;
        self.rif = details.rif;
        self.phone = details.phone;
        self.address = details.address;
        Ok(())
    }
}
