//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or supplied role name is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid user role: {0}")]
pub struct RoleParseError(pub String);

/// Role attached to every storefront account.
///
/// Every signup starts as [`UserRole::Customer`]; admins are promoted
/// out of band (see the `mercato user promote` command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store operator with catalogue and analytics access.
    Admin,
}

impl UserRole {
    /// Stable name used in the database and in API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may use admin-only endpoints.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for role in [UserRole::Customer, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert_eq!(
            "owner".parse::<UserRole>(),
            Err(RoleParseError("owner".to_owned()))
        );
    }

    #[test]
    fn test_default_is_customer() {
        assert_eq!(UserRole::default(), UserRole::Customer);
        assert!(!UserRole::Customer.is_admin());
        assert!(UserRole::Admin.is_admin());
    }
}
