use core::str::FromStr;

use serde::{Deserialize, Serialize};

use freightdesk_core::DomainError;

/// Access role carried in the token claims.
///
/// Roles are a closed set: read-scoping and admin gates dispatch on the
/// variant directly, never on free-form role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Superuser,
    GeneralAdmin,
    OfficeAdmin,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superuser => "superuser",
            Role::GeneralAdmin => "general_admin",
            Role::OfficeAdmin => "office_admin",
            Role::Operator => "operator",
        }
    }

    /// Superusers and general admins: company-wide reads, audit log access,
    /// company-info updates.
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Superuser | Role::GeneralAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superuser" => Ok(Role::Superuser),
            "general_admin" => Ok(Role::GeneralAdmin),
            "office_admin" => Ok(Role::OfficeAdmin),
            "operator" => Ok(Role::Operator),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Superuser, Role::GeneralAdmin, Role::OfficeAdmin, Role::Operator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn only_superuser_and_general_admin_are_admin_tier() {
        assert!(Role::Superuser.is_admin_tier());
        assert!(Role::GeneralAdmin.is_admin_tier());
        assert!(!Role::OfficeAdmin.is_admin_tier());
        assert!(!Role::Operator.is_admin_tier());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("dispatcher".parse::<Role>().is_err());
    }
}
