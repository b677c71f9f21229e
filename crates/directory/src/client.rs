use core::str::FromStr;

use serde::{Deserialize, Serialize};

use freightdesk_core::{ClientId, DomainError, DomainResult};

/// National identity prefix: natural (V), foreign (E), juridical (J),
/// government (G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientIdType {
    V,
    E,
    J,
    G,
}

impl ClientIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientIdType::V => "V",
            ClientIdType::E => "E",
            ClientIdType::J => "J",
            ClientIdType::G => "G",
        }
    }
}

impl core::fmt::Display for ClientIdType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientIdType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V" => Ok(ClientIdType::V),
            "E" => Ok(ClientIdType::E),
            "J" => Ok(ClientIdType::J),
            "G" => Ok(ClientIdType::G),
            other => Err(DomainError::validation(format!(
                "id_type must be one of V, E, J, G (got {other:?})"
            ))),
        }
    }
}

/// Composite identity key. Clients are deduplicated on this key, never on
/// their contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientKey {
    pub id_type: ClientIdType,
    pub id_number: String,
}

/// A sender or recipient. Shared across invoices; lifetime independent of
/// any one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub id_type: ClientIdType,
    pub id_number: String,
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Input payload for client lookup-or-create and CRUD writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub id_type: ClientIdType,
    pub id_number: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl ClientDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.id_number.trim().is_empty() {
            return Err(DomainError::validation("client id_number must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("client name must not be empty"));
        }
        Ok(())
    }

    pub fn key(&self) -> ClientKey {
        ClientKey {
            id_type: self.id_type,
            id_number: self.id_number.trim().to_string(),
        }
    }
}

impl Client {
    pub fn from_details(id: ClientId, details: ClientDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id,
            id_type: details.id_type,
            id_number: details.id_number.trim().to_string(),
            name: details.name,
            phone: details.phone,
            address: details.address,
        })
    }

    pub fn key(&self) -> ClientKey {
        ClientKey {
            id_type: self.id_type,
            id_number: self.id_number.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(id_number: &str, name: &str) -> ClientDetails {
        ClientDetails {
            id_type: ClientIdType::V,
            id_number: id_number.to_string(),
            name: name.to_string(),
            phone: String::new(),
            address: String::new(),
        }
    }

    #[test]
    fn key_ignores_contact_fields() {
        let a = ClientDetails {
            phone: "0414-1234567".to_string(),
            address: "Calle 1".to_string(),
            ..details("12345678", "Maria Perez")
        };
        let b = details("12345678", "M. Perez");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_distinguishes_id_types() {
        let v = details("12345678", "Maria Perez");
        let j = ClientDetails {
            id_type: ClientIdType::J,
            ..details("12345678", "Transporte MP C.A.")
        };
        assert_ne!(v.key(), j.key());
    }

    #[test]
    fn empty_id_number_is_rejected() {
        assert!(details("  ", "Maria Perez").validate().is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(details("12345678", "").validate().is_err());
    }

    #[test]
    fn id_type_round_trips_through_str() {
        for t in [ClientIdType::V, ClientIdType::E, ClientIdType::J, ClientIdType::G] {
            assert_eq!(t.as_str().parse::<ClientIdType>().unwrap(), t);
        }
        assert!("X".parse::<ClientIdType>().is_err());
    }
}
