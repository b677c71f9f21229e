//! Fleet domain module (vehicles and shipment manifests).
//!
//! The manifest state machine runs strictly forward (Planned, OnRoute,
//! Finalized) and keeps the assigned vehicle's status in lockstep.

pub mod manifest;
pub mod vehicle;

pub use manifest::{verify_dispatch_set, Manifest, ManifestDetails, ManifestStatus};
pub use vehicle::{Vehicle, VehicleDetails, VehicleStatus};
