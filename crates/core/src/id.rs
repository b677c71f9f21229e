//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(
    /// Identifier of a user (actor identity, mirrored from the auth boundary).
    UserId,
    "UserId"
);
impl_uuid_newtype!(
    /// Identifier of an office (branch location).
    OfficeId,
    "OfficeId"
);
impl_uuid_newtype!(
    /// Identifier of a client (sender or recipient).
    ClientId,
    "ClientId"
);
impl_uuid_newtype!(
    /// Identifier of an invoice (shipment waybill).
    InvoiceId,
    "InvoiceId"
);
impl_uuid_newtype!(
    /// Identifier of a merchandise line item.
    ItemId,
    "ItemId"
);
impl_uuid_newtype!(
    /// Identifier of a fleet vehicle.
    VehicleId,
    "VehicleId"
);
impl_uuid_newtype!(
    /// Identifier of a shipment manifest.
    ManifestId,
    "ManifestId"
);
impl_uuid_newtype!(
    /// Identifier of an operating expense.
    ExpenseId,
    "ExpenseId"
);
impl_uuid_newtype!(
    /// Identifier of a fixed asset.
    AssetId,
    "AssetId"
);
impl_uuid_newtype!(
    /// Identifier of a supplier.
    SupplierId,
    "SupplierId"
);
impl_uuid_newtype!(
    /// Identifier of a reference-data record (shipping type, payment method,
    /// merchandise/expense/asset category).
    RefId,
    "RefId"
);
impl_uuid_newtype!(
    /// Identifier of an audit log entry.
    AuditLogId,
    "AuditLogId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_display_and_parse() {
        let id = InvoiceId::new();
        let parsed: InvoiceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<OfficeId>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serde_is_transparent() {
        let id = ClientId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
