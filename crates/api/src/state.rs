//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Duration;

use crate::config::ApiConfig;
use crate::db::Storage;
use crate::services::{
    AccountService, AuthError, CredentialStore, PasswordHasher, StoreService, TokenService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The signing key inside the
/// token service is loaded once here and never changes afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    storage: Storage,
    accounts: AccountService,
    stores: StoreService,
}

impl AppState {
    /// Wire the services over `storage`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the Argon2 settings are invalid.
    pub fn new(config: ApiConfig, storage: Storage) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(
            config.auth.argon2_memory_kib,
            config.auth.argon2_iterations,
        )?;
        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            Duration::hours(i64::from(config.auth.token_ttl_hours)),
        );
        let accounts = AccountService::new(
            CredentialStore::new(storage.accounts.clone(), hasher),
            tokens,
        );
        let stores = StoreService::new(storage.stores.clone(), config.store_cardinality);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                accounts,
                stores,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    #[must_use]
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    #[must_use]
    pub fn stores(&self) -> &StoreService {
        &self.inner.stores
    }
}
