//! In-memory storage.
//!
//! Used by the test suites and by `VITRINEX_STORAGE=memory` demos. Both
//! tables sit behind one async mutex, so every repository call is a single
//! atomic step, which gives the same guarantees as the `PostgreSQL`
//! constraints: unique email, one slot per owner in single mode, and
//! owner-scoped updates that cannot interleave with another writer.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use vitrinex_core::{AccountId, Email, StoreId};

use super::{AccountRepository, RepositoryError, StoreRepository};
use crate::config::StoreCardinality;
use crate::models::{
    Account, AccountChanges, NewAccount, NewStore, PublicStore, Store, StoreChanges, StoreFilter,
    StoreOwner,
};

#[derive(Debug)]
struct AccountRecord {
    account: Account,
    password_hash: String,
}

#[derive(Debug)]
struct StoreRecord {
    store: Store,
    /// `Some(0)` for single-mode rows, mirroring the `owner_slot` column.
    slot: Option<i16>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<AccountRecord>,
    stores: Vec<StoreRecord>,
}

impl Tables {
    fn account(&self, id: AccountId) -> Option<&AccountRecord> {
        self.accounts.iter().find(|r| r.account.id == id)
    }

    fn public(&self, store: &Store) -> Result<PublicStore, RepositoryError> {
        let owner = self.account(store.owner_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("store {} has no owner", store.id))
        })?;
        Ok(PublicStore::new(
            store.clone(),
            StoreOwner {
                username: owner.account.username.clone(),
                avatar_url: owner.account.avatar_url.clone(),
            },
        ))
    }

    /// Stores newest first; ties keep the most recently inserted first.
    fn stores_newest_first(&self) -> Vec<&Store> {
        let mut stores: Vec<&Store> = self.stores.iter().rev().map(|r| &r.store).collect();
        stores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        stores
    }
}

/// Non-durable implementation of both repository traits.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

const SINGLE_SLOT: i16 = 0;

const UNSLOTTED_STORES: &str =
    "account has stores created in multiple-store mode; migrate them before saving a single store";

fn new_store(owner: AccountId, store: &NewStore) -> Store {
    let now = Utc::now();
    Store {
        id: StoreId::generate(),
        owner_id: owner,
        name: store.name.clone(),
        mode: store.mode,
        description: store.description.clone(),
        logo_url: store.logo_url.clone(),
        area: store.area.clone(),
        category: store.category.clone(),
        address: store.address.clone(),
        lat: store.lat,
        lng: store.lng,
        is_active: store.is_active,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl AccountRepository for MemoryDatabase {
    async fn create(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        let mut tables = self.tables.lock().await;

        if tables.accounts.iter().any(|r| r.account.email == account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = Account {
            id: AccountId::generate(),
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            avatar_url: String::new(),
            bio: String::new(),
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(AccountRecord {
            account: created.clone(),
            password_hash: account.password_hash.clone(),
        });

        Ok(created)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.account(id).map(|r| r.account.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .iter()
            .find(|r| r.account.email == *email)
            .map(|r| r.account.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .iter()
            .find(|r| r.account.email == *email)
            .map(|r| (r.account.clone(), r.password_hash.clone())))
    }

    async fn email_taken_by_other(
        &self,
        email: &Email,
        except: AccountId,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .iter()
            .any(|r| r.account.email == *email && r.account.id != except))
    }

    async fn update(
        &self,
        id: AccountId,
        changes: &AccountChanges,
    ) -> Result<Account, RepositoryError> {
        let mut tables = self.tables.lock().await;

        if let Some(email) = &changes.email
            && tables
                .accounts
                .iter()
                .any(|r| r.account.email == *email && r.account.id != id)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let record = tables
            .accounts
            .iter_mut()
            .find(|r| r.account.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(username) = &changes.username {
            record.account.username.clone_from(username);
        }
        if let Some(email) = &changes.email {
            record.account.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            record.password_hash.clone_from(hash);
        }
        if let Some(avatar_url) = &changes.avatar_url {
            record.account.avatar_url.clone_from(avatar_url);
        }
        if let Some(bio) = &changes.bio {
            record.account.bio.clone_from(bio);
        }
        record.account.updated_at = Utc::now();

        Ok(record.account.clone())
    }
}

#[async_trait]
impl StoreRepository for MemoryDatabase {
    async fn list_public(&self, filter: &StoreFilter) -> Result<Vec<PublicStore>, RepositoryError> {
        let tables = self.tables.lock().await;
        tables
            .stores_newest_first()
            .into_iter()
            .filter(|s| s.is_active && filter.matches(s))
            .map(|s| tables.public(s))
            .collect()
    }

    async fn find_public(&self, id: StoreId) -> Result<Option<PublicStore>, RepositoryError> {
        let tables = self.tables.lock().await;
        tables
            .stores
            .iter()
            .find(|r| r.store.id == id)
            .map(|r| tables.public(&r.store))
            .transpose()
    }

    async fn list_owned(&self, owner: AccountId) -> Result<Vec<Store>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .stores_newest_first()
            .into_iter()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        owner: AccountId,
        store: &NewStore,
        cardinality: StoreCardinality,
    ) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.lock().await;

        if tables.account(owner).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let slot = match cardinality {
            StoreCardinality::Single => Some(SINGLE_SLOT),
            StoreCardinality::Multiple => None,
        };
        if slot.is_some()
            && tables
                .stores
                .iter()
                .any(|r| r.store.owner_id == owner && r.slot == slot)
        {
            return Err(RepositoryError::Conflict(
                "account already owns a store".to_owned(),
            ));
        }

        let created = new_store(owner, store);
        tables.stores.push(StoreRecord {
            store: created.clone(),
            slot,
        });
        Ok(created)
    }

    async fn upsert_single(
        &self,
        owner: AccountId,
        changes: &StoreChanges,
    ) -> Result<Option<(Store, bool)>, RepositoryError> {
        let mut tables = self.tables.lock().await;

        if let Some(record) = tables
            .stores
            .iter_mut()
            .find(|r| r.store.owner_id == owner && r.slot == Some(SINGLE_SLOT))
        {
            changes.apply_to(&mut record.store);
            record.store.updated_at = Utc::now();
            return Ok(Some((record.store.clone(), false)));
        }

        let Some(draft) = changes.to_new_store() else {
            return Ok(None);
        };
        if tables.account(owner).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .stores
            .iter()
            .any(|r| r.store.owner_id == owner && r.slot.is_none())
        {
            return Err(RepositoryError::Conflict(UNSLOTTED_STORES.to_owned()));
        }

        let created = new_store(owner, &draft);
        tables.stores.push(StoreRecord {
            store: created.clone(),
            slot: Some(SINGLE_SLOT),
        });
        Ok(Some((created, true)))
    }

    async fn update_owned(
        &self,
        owner: AccountId,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Option<Store>, RepositoryError> {
        let mut tables = self.tables.lock().await;

        let Some(record) = tables
            .stores
            .iter_mut()
            .find(|r| r.store.id == id && r.store.owner_id == owner)
        else {
            return Ok(None);
        };

        changes.apply_to(&mut record.store);
        record.store.updated_at = Utc::now();
        Ok(Some(record.store.clone()))
    }

    async fn delete_owned(&self, owner: AccountId, id: StoreId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.stores.len();
        tables
            .stores
            .retain(|r| !(r.store.id == id && r.store.owner_id == owner));
        Ok(tables.stores.len() < before)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrinex_core::{AccountRole, StoreMode};

    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            email: Email::parse(email).unwrap(),
            role: AccountRole::Standard,
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    fn draft(name: &str) -> NewStore {
        NewStore {
            name: name.to_string(),
            mode: StoreMode::Products,
            description: String::new(),
            logo_url: String::new(),
            area: "Providencia".to_string(),
            category: "cafe".to_string(),
            address: String::new(),
            lat: None,
            lng: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = MemoryDatabase::default();
        AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap();

        let err = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_credentials_round_trip_hash() {
        let db = MemoryDatabase::default();
        let account = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap();

        let (found, hash) = db
            .find_credentials(&account.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(hash, "$argon2id$fake");
    }

    #[tokio::test]
    async fn test_single_slot_is_exclusive() {
        let db = MemoryDatabase::default();
        let owner = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap()
            .id;

        StoreRepository::create(&db, owner, &draft("One"), StoreCardinality::Single)
            .await
            .unwrap();
        let err = StoreRepository::create(&db, owner, &draft("Two"), StoreCardinality::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let rename = StoreChanges {
            name: Some("Renamed".to_string()),
            ..StoreChanges::default()
        };
        let (store, created) = db.upsert_single(owner, &rename).await.unwrap().unwrap();
        assert!(!created);
        assert_eq!(store.name, "Renamed");
        assert_eq!(store.area, "Providencia");
        assert_eq!(db.list_owned(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_without_name_creates_nothing() {
        let db = MemoryDatabase::default();
        let owner = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap()
            .id;

        let changes = StoreChanges {
            description: Some("sin nombre".to_string()),
            ..StoreChanges::default()
        };
        assert!(db.upsert_single(owner, &changes).await.unwrap().is_none());
        assert!(db.list_owned(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_refuses_owner_with_unslotted_stores() {
        let db = MemoryDatabase::default();
        let owner = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap()
            .id;
        StoreRepository::create(&db, owner, &draft("Legacy"), StoreCardinality::Multiple)
            .await
            .unwrap();

        let changes = StoreChanges {
            name: Some("Single".to_string()),
            ..StoreChanges::default()
        };
        let err = db.upsert_single(owner, &changes).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(db.list_owned(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_for_unknown_owner_is_not_found() {
        let db = MemoryDatabase::default();
        let err = StoreRepository::create(
            &db,
            AccountId::generate(),
            &draft("Orphan"),
            StoreCardinality::Multiple,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_owner_scoped_mutations() {
        let db = MemoryDatabase::default();
        let alice = AccountRepository::create(&db, &new_account("a@x.com"))
            .await
            .unwrap()
            .id;
        let bob = AccountRepository::create(&db, &new_account("b@x.com"))
            .await
            .unwrap()
            .id;
        let store = StoreRepository::create(&db, alice, &draft("Alice Shop"), StoreCardinality::Multiple)
            .await
            .unwrap();

        let changes = StoreChanges {
            name: Some("Stolen".to_string()),
            ..StoreChanges::default()
        };
        assert!(db.update_owned(bob, store.id, &changes).await.unwrap().is_none());
        assert!(!db.delete_owned(bob, store.id).await.unwrap());

        let public = db.find_public(store.id).await.unwrap().unwrap();
        assert_eq!(public.name, "Alice Shop");

        assert!(db.delete_owned(alice, store.id).await.unwrap());
        assert!(db.find_public(store.id).await.unwrap().is_none());
    }
}
