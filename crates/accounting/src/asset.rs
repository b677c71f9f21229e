use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightdesk_core::{AssetId, DomainError, DomainResult, OfficeId, RefId};

/// Grouping label for fixed assets (furniture, machinery, and so on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCategory {
    pub id: RefId,
    pub name: String,
}

impl AssetCategory {
    pub fn new(name: String) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("asset category name must not be empty"));
        }
        Ok(Self { id: RefId::new(), name })
    }
}

/// A fixed asset on the company books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<RefId>,
    pub office_id: Option<OfficeId>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<RefId>,
    #[serde(default)]
    pub office_id: Option<OfficeId>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_value: Decimal,
}

impl AssetDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("asset name must not be empty"));
        }
        if self.purchase_value < Decimal::ZERO {
            return Err(DomainError::validation("purchase value must not be negative"));
        }
        Ok(())
    }
}

impl Asset {
    pub fn from_details(details: AssetDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: AssetId::new(),
            name: details.name,
            description: details.description,
            category_id: details.category_id,
            office_id: details.office_id,
            purchase_date: details.purchase_date,
            purchase_value: details.purchase_value,
        })
    }

    pub fn update(&mut self, details: AssetDetails) -> DomainResult<()> {
        details.validate()?;
        self.name = details.name;
        self.description = details.description;
        self.category_id = details.category_id;
        self.office_id = details.office_id;
        self.purchase_date = details.purchase_date;
        self.purchase_value = details.purchase_value;
        Ok(())
    }
}
