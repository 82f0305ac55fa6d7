//! Persistence for accounts and stores.
//!
//! # Schema: `vitrinex`
//!
//! ## Tables
//!
//! - `account` - Login identity, password hash and profile fields
//! - `store` - Ownership-scoped stores; `(owner_id, owner_slot)` is unique
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p vitrinex-cli -- migrate
//! ```
//!
//! Handlers never talk to a backend directly: they go through the
//! [`AccountRepository`] and [`StoreRepository`] traits, implemented by the
//! `PostgreSQL` repositories and by [`MemoryDatabase`].

pub mod accounts;
pub mod memory;
pub mod stores;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use vitrinex_core::{AccountId, Email, StoreId};

use crate::config::{StorageBackend, StoreCardinality};
use crate::models::{
    Account, AccountChanges, NewAccount, NewStore, PublicStore, Store, StoreChanges, StoreFilter,
};

pub use accounts::PgAccountRepository;
pub use memory::MemoryDatabase;
pub use stores::PgStoreRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, a foreign-key violation
/// to `NotFound`, everything else to `Database`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(what.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// Account persistence. Password hashes go in and come out only through
/// [`AccountRepository::find_credentials`]; [`Account`] never carries one.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    /// Look up an account together with its stored password hash.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError>;

    /// Whether `email` belongs to an account other than `except`.
    async fn email_taken_by_other(
        &self,
        email: &Email,
        except: AccountId,
    ) -> Result<bool, RepositoryError>;

    /// Apply the provided fields; omitted fields keep their value.
    ///
    /// Fails with `NotFound` when the account is gone and `Conflict` when the
    /// new email is taken.
    async fn update(
        &self,
        id: AccountId,
        changes: &AccountChanges,
    ) -> Result<Account, RepositoryError>;
}

/// Store persistence. Every owner-scoped method filters by id and owner in
/// the same statement as the mutation.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Active stores matching every present filter field, newest first.
    async fn list_public(&self, filter: &StoreFilter) -> Result<Vec<PublicStore>, RepositoryError>;

    /// Any store by id, active or not.
    async fn find_public(&self, id: StoreId) -> Result<Option<PublicStore>, RepositoryError>;

    /// Stores owned by `owner`, newest first.
    async fn list_owned(&self, owner: AccountId) -> Result<Vec<Store>, RepositoryError>;

    /// Insert a store for `owner`.
    ///
    /// Under [`StoreCardinality::Single`] the row claims the owner's only
    /// slot, and a second insert fails with `Conflict`. Fails with `NotFound`
    /// when the owner does not exist.
    async fn create(
        &self,
        owner: AccountId,
        store: &NewStore,
        cardinality: StoreCardinality,
    ) -> Result<Store, RepositoryError>;

    /// Apply `changes` to the owner's single store, creating it when absent.
    ///
    /// Returns the store and whether it was created. Creating needs a name:
    /// without one, and with no existing store, the result is `None`.
    /// Creating fails with `Conflict` when the owner still has stores outside
    /// the single slot, and with `NotFound` when the owner does not exist.
    async fn upsert_single(
        &self,
        owner: AccountId,
        changes: &StoreChanges,
    ) -> Result<Option<(Store, bool)>, RepositoryError>;

    /// Update a store only if `owner` owns it. `None` when no such store.
    async fn update_owned(
        &self,
        owner: AccountId,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Option<Store>, RepositoryError>;

    /// Delete a store only if `owner` owns it. `false` when no such store.
    async fn delete_owned(&self, owner: AccountId, id: StoreId) -> Result<bool, RepositoryError>;
}

/// The repositories backing one running service.
#[derive(Clone)]
pub struct Storage {
    pub accounts: Arc<dyn AccountRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pool: Option<PgPool>,
}

impl Storage {
    /// Connect to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
    pub async fn connect(backend: &StorageBackend) -> Result<Self, sqlx::Error> {
        match backend {
            StorageBackend::Postgres { database_url } => {
                let pool = create_pool(database_url).await?;
                Ok(Self::postgres(pool))
            }
            StorageBackend::Memory => Ok(Self::memory()),
        }
    }

    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            stores: Arc::new(PgStoreRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Fresh, empty in-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        let db = Arc::new(MemoryDatabase::default());
        Self {
            accounts: db.clone(),
            stores: db,
            pool: None,
        }
    }

    /// The underlying pool, when backed by `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Readiness probe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
