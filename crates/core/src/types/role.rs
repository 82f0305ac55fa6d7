//! Account role tag.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected standard, vendor or customer)")]
pub struct RoleError(String);

/// Role attached to an account at registration.
///
/// `standard` is the only role most deployments use; `vendor` and `customer`
/// exist for deployments that distinguish sellers from buyers. The legacy
/// wire value `user` is accepted as an alias of `standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[default]
    #[serde(alias = "user")]
    Standard,
    Vendor,
    Customer,
}

impl AccountRole {
    /// Stable string form, as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Vendor => "vendor",
            Self::Customer => "customer",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" | "user" => Ok(Self::Standard),
            "vendor" => Ok(Self::Vendor),
            "customer" => Ok(Self::Customer),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_user_alias() {
        assert_eq!("user".parse::<AccountRole>().unwrap(), AccountRole::Standard);
        let role: AccountRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, AccountRole::Standard);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"standard\"");
    }

    #[test]
    fn test_unknown_role() {
        assert!("admin".parse::<AccountRole>().is_err());
    }
}
