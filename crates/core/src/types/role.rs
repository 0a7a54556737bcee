//! Caller roles for authorization decisions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The role a caller acts under.
///
/// Roles are ordered by privilege: `Anonymous < Customer < Admin`, so a
/// requirement check is a single comparison via [`Role::at_least`].
///
/// `Anonymous` is a derived state (no credential presented) and is never
/// stored; user records carry `Customer` or `Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No credential presented; may only reach allow-listed routes.
    #[default]
    Anonymous,
    /// A registered shopper.
    Customer,
    /// Full access to catalog, user, and order administration.
    Admin,
}

/// Error returned when parsing an unknown role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl Role {
    /// The canonical lowercase name, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Whether this role meets or exceeds `required`.
    #[must_use]
    pub fn at_least(&self, required: Self) -> bool {
        *self >= required
    }

    /// Whether this is the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(Self::Anonymous),
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
    fn test_privilege_ordering() {
        assert!(Role::Admin.at_least(Role::Customer));
        assert!(Role::Admin.at_least(Role::Admin));
        assert!(Role::Customer.at_least(Role::Anonymous));
        assert!(!Role::Customer.at_least(Role::Admin));
        assert!(!Role::Anonymous.at_least(Role::Customer));
    }

    #[test]
    fn test_parse_roundtrip() {
        for role in [Role::Anonymous, Role::Customer, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn test_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Customer.is_admin());
    }
}
