use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, ManifestId, UserId, VehicleId};

use crate::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    Planned,
    OnRoute,
    Finalized,
}

/// Payload for manifest creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDetails {
    pub manifest_number: String,
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub driver_id: Option<UserId>,
}

impl ManifestDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.manifest_number.trim().is_empty() {
            return Err(DomainError::validation("manifest number must not be empty"));
        }
        Ok(())
    }
}

/// A shipment manifest: one vehicle, one trip, a set of invoices.
///
/// Moves strictly forward through Planned, OnRoute, Finalized. The
/// transitions keep the vehicle's status in lockstep; callers verify the
/// invoice set before dispatching and apply the whole change or none of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    id: ManifestId,
    manifest_number: String,
    vehicle_id: VehicleId,
    driver_id: Option<UserId>,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    status: ManifestStatus,
}

impl Manifest {
    pub fn new(details: ManifestDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: ManifestId::new(),
            manifest_number: details.manifest_number.trim().to_string(),
            vehicle_id: details.vehicle_id,
            driver_id: details.driver_id,
            departure_time: None,
            arrival_time: None,
            status: ManifestStatus::Planned,
        })
    }

    /// Rebuilds a manifest from stored fields without re-running creation
    /// validation.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ManifestId,
        manifest_number: String,
        vehicle_id: VehicleId,
        driver_id: Option<UserId>,
        departure_time: Option<DateTime<Utc>>,
        arrival_time: Option<DateTime<Utc>>,
        status: ManifestStatus,
    ) -> Self {
        Self {
            id,
            manifest_number,
            vehicle_id,
            driver_id,
            departure_time,
            arrival_time,
            status,
        }
    }

    pub fn id(&self) -> ManifestId {
        self.id
    }

    pub fn manifest_number(&self) -> &str {
        &self.manifest_number
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn driver_id(&self) -> Option<UserId> {
        self.driver_id
    }

    pub fn departure_time(&self) -> Option<DateTime<Utc>> {
        self.departure_time
    }

    pub fn arrival_time(&self) -> Option<DateTime<Utc>> {
        self.arrival_time
    }

    pub fn status(&self) -> ManifestStatus {
        self.status
    }

    /// Sends the manifest out: Planned to OnRoute, stamping departure and
    /// claiming the vehicle. The vehicle check runs before any mutation, so
    /// a failure leaves both records untouched.
    pub fn dispatch(
        &mut self,
        vehicle: &mut Vehicle,
        driver_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status != ManifestStatus::Planned {
            return Err(DomainError::conflict("already dispatched or finalized"));
        }
        vehicle.depart()?;
        self.status = ManifestStatus::OnRoute;
        self.departure_time = Some(now);
        if driver_id.is_some() {
            self.driver_id = driver_id;
        }
        Ok(())
    }

    /// Closes the trip: OnRoute to Finalized, stamping arrival and freeing
    /// the vehicle.
    pub fn finalize_trip(&mut self, vehicle: &mut Vehicle, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ManifestStatus::OnRoute {
            return Err(DomainError::validation("manifest not on route"));
        }
        self.status = ManifestStatus::Finalized;
        self.arrival_time = Some(now);
        vehicle.return_to_service();
        Ok(())
    }
}

/// All-or-nothing check over the requested invoice set: every requested id
/// must have resolved to an invoice still awaiting dispatch.
pub fn verify_dispatch_set(requested: usize, matched: usize) -> DomainResult<()> {
    if requested != matched {
        return Err(DomainError::validation(
            "some invoices are not available for dispatch",
        ));
    }
    Ok(())
}
