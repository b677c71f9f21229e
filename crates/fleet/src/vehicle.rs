use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, VehicleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    OnRoute,
    InMaintenance,
}

/// A truck or van in the company fleet. A vehicle carries at most one
/// active manifest at a time; the status field enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub capacity_kg: Decimal,
    pub status: VehicleStatus,
    pub driver: Option<String>,
    pub image: Option<String>,
}

/// Payload for vehicle creation and replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub license_plate: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub year: u16,
    pub capacity_kg: Decimal,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl VehicleDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.license_plate.trim().is_empty() {
            return Err(DomainError::validation("license plate must not be empty"));
        }
        if self.capacity_kg <= Decimal::ZERO {
            return Err(DomainError::validation("capacity must be greater than zero"));
        }
        Ok(())
    }
}

impl Vehicle {
    pub fn from_details(details: VehicleDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: VehicleId::new(),
            license_plate: details.license_plate.trim().to_string(),
            brand: details.brand,
            model: details.model,
            year: details.year,
            capacity_kg: details.capacity_kg,
            status: VehicleStatus::Available,
            driver: details.driver,
            image: details.image,
        })
    }

    /// Replaces the descriptive fields. Status stays under the control of
    /// manifest transitions.
    pub fn update(&mut self, details: VehicleDetails) -> DomainResult<()> {
        details.validate()?;
        self.license_plate = details.license_plate.trim().to_string();
        self.brand = details.brand;
        self.model = details.model;
        self.year = details.year;
        self.capacity_kg = details.capacity_kg;
        self.driver = details.driver;
        self.image = details.image;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Claims the vehicle for a departing manifest.
    pub fn depart(&mut self) -> DomainResult<()> {
        if !self.is_available() {
            return Err(DomainError::conflict(format!(
                "vehicle {} is not available",
                self.license_plate
            )));
        }
        self.status = VehicleStatus::OnRoute;
        Ok(())
    }

    /// Releases the vehicle when its trip finishes.
    pub fn return_to_service(&mut self) {
        self.status = VehicleStatus::Available;
    }
}
