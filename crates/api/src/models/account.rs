//! Account models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrinex_core::{AccountId, AccountRole, Email};

use crate::db::RepositoryError;

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: Email,
    pub role: AccountRole,
    pub avatar_url: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for `vitrinex.account` (hash column excluded).
#[derive(Debug, sqlx::FromRow)]
pub struct AccountRow {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub avatar_url: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<AccountRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email,
            role,
            avatar_url: row.avatar_url,
            bio: row.bio,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for inserting an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Email,
    pub role: AccountRole,
    pub password_hash: String,
}

/// Partial account update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Public projection of an account, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: AccountId,
    pub username: String,
    pub email: Email,
    pub role: AccountRole,
    pub avatar_url: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            avatar_url: account.avatar_url,
            bio: account.bio,
            created_at: account.created_at,
        }
    }
}

/// Registration request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile update request body. Any subset of fields may be sent; unknown
/// keys (including `role`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(email: &str, role: &str) -> AccountRow {
        AccountRow {
            id: AccountId::generate(),
            username: "alice".to_string(),
            email: email.to_string(),
            role: role.to_string(),
            avatar_url: String::new(),
            bio: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_data() {
        assert!(Account::try_from(row("a@x.com", "vendor")).is_ok());
        assert!(matches!(
            Account::try_from(row("not-an-email", "standard")),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            Account::try_from(row("a@x.com", "admin")),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_profile_serializes_camel_case_without_hash() {
        let account = Account::try_from(row("a@x.com", "standard")).unwrap();
        let json = serde_json::to_value(AccountProfile::from(account)).unwrap();

        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["role"], "standard");
        assert!(json.get("avatarUrl").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_profile_update_ignores_role() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"bio":"hola","role":"vendor","avatarUrl":""}"#).unwrap();
        assert_eq!(update.bio.as_deref(), Some("hola"));
        assert_eq!(update.avatar_url.as_deref(), Some(""));
        assert!(update.username.is_none());
    }
}
