use serde::{Deserialize, Serialize};

use freightdesk_core::{DomainError, DomainResult, OfficeId};

/// A branch location. Each office owns its own invoice numbering sequence;
/// the first letter of its name becomes the invoice prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    id: OfficeId,
    name: String,
    address: String,
    phone: String,
    next_invoice_number: u32,
}

/// Input payload for creating or updating an office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeDetails {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

impl OfficeDetails {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    let Some(first) = name.trim().chars().next() else {
        return Err(DomainError::validation("office name must not be empty"));
    };
    // The name's first character becomes the invoice prefix letter and the
    // wire format promises exactly one upper-case ASCII letter.
    if !first.is_ascii_alphabetic() {
        return Err(DomainError::validation(
            "office name must start with an ASCII letter",
        ));
    }
    Ok(())
}

impl Office {
    /// Create a new office with its counter at the starting position.
    pub fn new(id: OfficeId, details: OfficeDetails) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id,
            name: details.name.trim().to_string(),
            address: details.address,
            phone: details.phone,
            next_invoice_number: 1,
        })
    }

    /// Rehydrate from storage. The counter is trusted as persisted.
    pub fn from_parts(
        id: OfficeId,
        name: String,
        address: String,
        phone: String,
        next_invoice_number: u32,
    ) -> Self {
        Self {
            id,
            name,
            address,
            phone,
            next_invoice_number,
        }
    }

    pub fn id(&self) -> OfficeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn next_invoice_number(&self) -> u32 {
        self.next_invoice_number
    }

    /// Invoice prefix letter: first character of the name, upper-cased.
    pub fn prefix_letter(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('X')
    }

    /// Claim the next invoice sequence value and advance the counter.
    ///
    /// Must only be called while this row is exclusively held by the issuing
    /// transaction; the caller persists the advanced counter before commit.
    pub fn allocate_invoice_number(&mut self) -> (u32, char) {
        let sequence = self.next_invoice_number;
        self.next_invoice_number += 1;
        (sequence, self.prefix_letter())
    }

    /// Apply updated details. The numbering counter is never touched here.
    pub fn update(&mut self, details: OfficeDetails) -> DomainResult<()> {
        details.validate()?;
        self.name = details.name.trim().to_string();
        self.address = details.address;
        self.phone = details.phone;
        Ok(())
    }
}
