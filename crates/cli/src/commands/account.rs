//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! VX_ACCOUNT_PASSWORD='...' vx-cli account create -e ana@example.com -u ana -r vendor
//! ```
//!
//! The password is read from the environment so it never shows up in shell
//! history or process listings.

use vitrinex_api::config::argon2_params_from_env;
use vitrinex_api::db::Storage;
use vitrinex_api::services::auth::NewCredentials;
use vitrinex_api::services::{AuthError, CredentialStore, PasswordHasher};
use vitrinex_core::{AccountId, AccountRole, Email};

use super::{CliError, connect};

/// Environment variable holding the new account's password.
pub const PASSWORD_ENV: &str = "VX_ACCOUNT_PASSWORD";

/// Create an account directly in the database.
///
/// # Errors
///
/// Returns `CliError` for a missing password, an invalid email or role, a
/// weak password, a taken email, or a database failure.
pub async fn create(email: &str, username: &str, role: &str) -> Result<AccountId, CliError> {
    dotenvy::dotenv().ok();

    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::Validation("username cannot be empty".to_string()).into());
    }
    let email = Email::parse(email).map_err(AuthError::from)?;
    let role: AccountRole = role.parse().map_err(AuthError::from)?;
    let password = std::env::var(PASSWORD_ENV).map_err(|_| CliError::MissingEnvVar(PASSWORD_ENV))?;

    let storage = connect().await?;
    let credentials = credential_store(&storage)?;

    tracing::info!("Creating account: {} ({})", email, role);
    let account = credentials
        .create(NewCredentials {
            username: username.to_owned(),
            email,
            role,
            password,
        })
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        account.id,
        account.email,
        account.role
    );
    Ok(account.id)
}

/// Credential store over `storage` with the configured hashing cost.
pub(crate) fn credential_store(storage: &Storage) -> Result<CredentialStore, CliError> {
    let (memory_kib, iterations) = argon2_params_from_env()?;
    let hasher = PasswordHasher::new(memory_kib, iterations)?;
    Ok(CredentialStore::new(storage.accounts.clone(), hasher))
}
