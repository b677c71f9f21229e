use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Company-wide settings kept as a single well-known record. Every field
/// has a usable default so a fresh deployment works before anyone edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub rif: String,
    pub address: String,
    pub phone: String,
    pub postal_license: String,
    pub logo: Option<String>,
    pub login_image: Option<String>,
    /// Base freight rate per kilogram.
    pub cost_per_kg: Decimal,
    /// Percentage, e.g. 16.00.
    pub tax_rate: Decimal,
    /// Official VES/USD exchange rate.
    pub bcv_rate: Decimal,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            rif: String::new(),
            address: String::new(),
            phone: String::new(),
            postal_license: String::new(),
            logo: None,
            login_image: None,
            cost_per_kg: Decimal::new(100, 2),
            tax_rate: Decimal::new(1600, 2),
            bcv_rate: Decimal::new(3650, 2),
        }
    }
}

/// Partial update payload. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfoUpdate {
    pub name: Option<String>,
    pub rif: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub postal_license: Option<String>,
    pub logo: Option<String>,
    pub login_image: Option<String>,
    pub cost_per_kg: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub bcv_rate: Option<Decimal>,
}

impl CompanyInfo {
    pub fn apply(&mut self, update: CompanyInfoUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(rif) = update.rif {
            self.rif = rif;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(postal_license) = update.postal_license {
            self.postal_license = postal_license;
        }
        if let Some(logo) = update.logo {
            self.logo = Some(logo);
        }
        if let Some(login_image) = update.login_image {
            self.login_image = Some(login_image);
        }
        if let Some(cost_per_kg) = update.cost_per_kg {
            self.cost_per_kg = cost_per_kg;
        }
        if let Some(tax_rate) = update.tax_rate {
            self.tax_rate = tax_rate;
        }
        if let Some(bcv_rate) = update.bcv_rate {
            self.bcv_rate = bcv_rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults_cover_rates() {
        let info = CompanyInfo::default();
        assert_eq!(info.cost_per_kg, dec!(1.00));
        assert_eq!(info.tax_rate, dec!(16.00));
        assert_eq!(info.bcv_rate, dec!(36.50));
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let mut info = CompanyInfo::default();
        info.apply(CompanyInfoUpdate {
            name: Some("Transporte Alianza C.A.".to_string()),
            bcv_rate: Some(dec!(40.25)),
            ..CompanyInfoUpdate::default()
        });
        assert_eq!(info.name, "Transporte Alianza C.A.");
        assert_eq!(info.bcv_rate, dec!(40.25));
        assert_eq!(info.tax_rate, dec!(16.00));
    }

    #[test]
    fn absent_fields_deserialize_as_no_change() {
        let update: CompanyInfoUpdate =
            serde_json::from_str(r#"{"cost_per_kg": "2.50"}"#).unwrap();
        assert_eq!(update.cost_per_kg, Some(dec!(2.50)));
        assert_eq!(update.name, None);
    }
}
