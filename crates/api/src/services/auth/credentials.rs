//! Credential store: the only path by which a plaintext password reaches
//! storage, and it always arrives hashed.

use std::sync::Arc;

use vitrinex_core::{AccountId, AccountRole, Email};

use super::AuthError;
use super::password::{PasswordHasher, validate_password};
use crate::db::{AccountRepository, RepositoryError};
use crate::models::{Account, AccountChanges, NewAccount};

/// Fields for creating an account, password still in plaintext.
#[derive(Clone)]
pub struct NewCredentials {
    pub username: String,
    pub email: Email,
    pub role: AccountRole,
    pub password: String,
}

/// Partial account update, password still in plaintext.
#[derive(Clone, Default)]
pub struct CredentialChanges {
    pub username: Option<String>,
    pub email: Option<Email>,
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Wraps the account repository and hashes every secret on its way in.
#[derive(Clone)]
pub struct CredentialStore {
    accounts: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: PasswordHasher) -> Self {
        Self { accounts, hasher }
    }

    /// Hash the password and insert the account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is out of bounds and
    /// `AuthError::EmailTaken` if the email is already registered.
    pub async fn create(&self, credentials: NewCredentials) -> Result<Account, AuthError> {
        validate_password(&credentials.password)?;
        let password_hash = self.hasher.hash(credentials.password).await?;

        self.accounts
            .create(&NewAccount {
                username: credentials.username,
                email: credentials.email,
                role: credentials.role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.find_by_email(email).await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.find_by_id(id).await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn email_taken_by_other(
        &self,
        email: &Email,
        except: AccountId,
    ) -> Result<bool, AuthError> {
        Ok(self.accounts.email_taken_by_other(email, except).await?)
    }

    /// Apply a partial update, hashing a new password if one is given.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword`, `AuthError::EmailTaken` on a
    /// uniqueness race, or `AuthError::AccountNotFound` if the account is gone.
    pub async fn update(
        &self,
        id: AccountId,
        changes: CredentialChanges,
    ) -> Result<Account, AuthError> {
        let password_hash = match changes.password {
            Some(password) => {
                validate_password(&password)?;
                Some(self.hasher.hash(password).await?)
            }
            None => None,
        };

        self.accounts
            .update(
                id,
                &AccountChanges {
                    username: changes.username,
                    email: changes.email,
                    password_hash,
                    avatar_url: changes.avatar_url,
                    bio: changes.bio,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                RepositoryError::NotFound => AuthError::AccountNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Check a password for `email`.
    ///
    /// Unknown emails still cost one hash verification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password alike.
    pub async fn verify(&self, email: &Email, password: &str) -> Result<Account, AuthError> {
        let Some((account, hash)) = self.accounts.find_credentials(email).await? else {
            self.hasher.verify_dummy(password.to_owned()).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if self.hasher.verify(password.to_owned(), hash).await? {
            Ok(account)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Spend one hash verification without looking anything up.
    pub(crate) async fn burn_verification(&self, password: &str) -> Result<(), AuthError> {
        self.hasher.verify_dummy(password.to_owned()).await
    }
}
