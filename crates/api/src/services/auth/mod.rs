//! Account service: registration, login, session resolution and profile.
//!
//! # Flow
//!
//! 1. `register` / `login` verify input against the [`CredentialStore`]
//! 2. [`TokenService`] mints a signed token for the account id
//! 3. The route layer puts the token in the session cookie
//! 4. Later requests are resolved back to an [`AccountId`] by the session
//!    middleware; `profile` and `update_profile` take that id

mod credentials;
mod error;
mod password;
mod token;

pub use credentials::{CredentialChanges, CredentialStore, NewCredentials};
pub use error::AuthError;
pub use password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PasswordHasher, validate_password};
pub use token::TokenService;

use tracing::instrument;

use vitrinex_core::{AccountId, AccountRole, Email};

use crate::models::{Account, LoginRequest, ProfileUpdate, RegisterRequest};

/// An authenticated account plus the token to hand back to the client.
#[derive(Debug)]
pub struct Session {
    pub account: Account,
    pub token: String,
}

/// Account operations.
pub struct AccountService {
    credentials: CredentialStore,
    tokens: TokenService,
}

/// Trimmed, non-empty value of a required field.
fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AccountService {
    #[must_use]
    pub const fn new(credentials: CredentialStore, tokens: TokenService) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Create an account and open a session for it.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` if username, email or password is missing
    /// - `AuthError::InvalidEmail`, `InvalidRole`, `WeakPassword` for bad values
    /// - `AuthError::EmailTaken` if the email is already registered
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AuthError> {
        let (Some(username), Some(email), Some(password)) = (
            required(request.username.as_deref()),
            required(request.email.as_deref()),
            request.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "username, email and password are required".to_string(),
            ));
        };

        let email = Email::parse(email)?;
        validate_password(password)?;
        let role = match required(request.role.as_deref()) {
            Some(role) => role.parse::<AccountRole>()?,
            None => AccountRole::default(),
        };

        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let account = self
            .credentials
            .create(NewCredentials {
                username: username.to_owned(),
                email,
                role,
                password: password.to_owned(),
            })
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "Account registered");
        self.open_session(account)
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` if email or password is missing
    /// - `AuthError::InvalidCredentials` for an unknown email, a malformed
    ///   email, or a wrong password; all three look the same to the caller
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AuthError> {
        let (Some(email), Some(password)) = (
            required(request.email.as_deref()),
            request.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "email and password are required".to_string(),
            ));
        };

        let Ok(email) = Email::parse(email) else {
            self.credentials.burn_verification(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let account = self.credentials.verify(&email, password).await.inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!("Login rejected");
            }
        })?;

        tracing::info!(account_id = %account.id, "Login succeeded");
        self.open_session(account)
    }

    /// Resolve a token to the account id it was issued for.
    ///
    /// Stateless: the account may no longer exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` when the token does not verify.
    pub fn verify_session(&self, token: &str) -> Result<AccountId, AuthError> {
        self.tokens.verify(token)
    }

    /// The caller's own account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account no longer exists.
    pub async fn profile(&self, caller: AccountId) -> Result<Account, AuthError> {
        self.credentials
            .find_by_id(caller)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Apply the fields present in `update` to the caller's account.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` for an empty username
    /// - `AuthError::InvalidEmail` / `WeakPassword` for bad values
    /// - `AuthError::EmailTaken` if another account already uses the email
    /// - `AuthError::AccountNotFound` if the account no longer exists
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        caller: AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, AuthError> {
        let username = match update.username.as_deref() {
            Some(raw) => Some(
                required(Some(raw))
                    .ok_or_else(|| AuthError::Validation("username cannot be empty".to_string()))?
                    .to_owned(),
            ),
            None => None,
        };

        let email = update.email.as_deref().map(Email::parse).transpose()?;
        if let Some(email) = &email
            && self.credentials.email_taken_by_other(email, caller).await?
        {
            return Err(AuthError::EmailTaken);
        }

        let account = self
            .credentials
            .update(
                caller,
                CredentialChanges {
                    username,
                    email,
                    password: update.password,
                    avatar_url: update.avatar_url.map(|v| v.trim().to_owned()),
                    bio: update.bio,
                },
            )
            .await?;

        tracing::info!(account_id = %account.id, "Profile updated");
        Ok(account)
    }

    fn open_session(&self, account: Account) -> Result<Session, AuthError> {
        let token = self.tokens.issue(account.id)?;
        Ok(Session { account, token })
    }
}
