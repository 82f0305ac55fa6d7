//! Ownership-scoped store management.
//!
//! Every mutation takes the caller's id and hands it to the repository
//! together with the store id, so "not yours" and "does not exist" are the
//! same `NotFound`.

mod error;

pub use error::StoreError;

use std::sync::Arc;

use tracing::instrument;

use vitrinex_core::{AccountId, StoreId, StoreMode};

use crate::config::StoreCardinality;
use crate::db::{RepositoryError, StoreRepository};
use crate::models::{
    NewStore, PublicStore, Store, StoreChanges, StoreFilter, StoreInput, StoreQuery,
};

/// What a save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Store operations.
pub struct StoreService {
    stores: Arc<dyn StoreRepository>,
    cardinality: StoreCardinality,
}

impl StoreService {
    #[must_use]
    pub fn new(stores: Arc<dyn StoreRepository>, cardinality: StoreCardinality) -> Self {
        Self {
            stores,
            cardinality,
        }
    }

    #[must_use]
    pub const fn cardinality(&self) -> StoreCardinality {
        self.cardinality
    }

    /// Active stores matching the query, newest first.
    ///
    /// Empty filter values impose no constraint and an unknown `mode` is
    /// ignored rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the query fails.
    pub async fn list_public(&self, query: StoreQuery) -> Result<Vec<PublicStore>, StoreError> {
        let filter = StoreFilter {
            area: non_empty(query.comuna),
            category: non_empty(query.tipo_negocio),
            mode: query.mode.as_deref().and_then(StoreMode::parse),
        };
        Ok(self.stores.list_public(&filter).await?)
    }

    /// Any store by id, for public profile pages.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is malformed or unknown.
    pub async fn get_public(&self, id: &str) -> Result<PublicStore, StoreError> {
        let id = parse_id(id)?;
        self.stores
            .find_public(id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// The caller's stores, newest first. Empty when they own none.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the query fails.
    pub async fn list_mine(&self, owner: AccountId) -> Result<Vec<Store>, StoreError> {
        Ok(self.stores.list_owned(owner).await?)
    }

    /// Create a store owned by the caller.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the name is missing or coordinates are
    ///   out of range
    /// - `StoreError::Conflict` in single-store mode when the caller already
    ///   owns a store
    #[instrument(skip(self, input))]
    pub async fn create(&self, owner: AccountId, input: StoreInput) -> Result<Store, StoreError> {
        let draft = new_store(input)?;
        let store = self
            .stores
            .create(owner, &draft, self.cardinality)
            .await
            .map_err(owned_write_error)?;

        tracing::info!(store_id = %store.id, "Store created");
        Ok(store)
    }

    /// Apply the fields present in `input` to the caller's single store,
    /// creating it when absent.
    ///
    /// Omitted fields keep their stored value. Concurrent first-time calls
    /// for the same owner still leave exactly one store: the repository
    /// resolves them on the owner's slot.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` for bad fields, or a missing name when the
    ///   store does not exist yet
    /// - `StoreError::Conflict` if the caller still owns stores created in
    ///   multiple-store mode
    #[instrument(skip(self, input))]
    pub async fn upsert(
        &self,
        owner: AccountId,
        input: StoreInput,
    ) -> Result<(Store, SaveOutcome), StoreError> {
        let changes = store_changes(input)?;
        let (store, created) = self
            .stores
            .upsert_single(owner, &changes)
            .await
            .map_err(owned_write_error)?
            .ok_or_else(|| StoreError::Validation("name is required".to_string()))?;

        let outcome = if created {
            SaveOutcome::Created
        } else {
            SaveOutcome::Updated
        };
        tracing::info!(store_id = %store.id, ?outcome, "Store saved");
        Ok((store, outcome))
    }

    /// Apply the fields present in `input` to a store the caller owns.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` for an empty name, unknown mode or
    ///   out-of-range coordinates
    /// - `StoreError::NotFound` if the id is malformed, unknown, or owned by
    ///   someone else
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        owner: AccountId,
        id: &str,
        input: StoreInput,
    ) -> Result<Store, StoreError> {
        let id = parse_id(id)?;
        let changes = store_changes(input)?;

        let store = self
            .stores
            .update_owned(owner, id, &changes)
            .await?
            .ok_or(StoreError::NotFound)?;

        tracing::info!(store_id = %store.id, "Store updated");
        Ok(store)
    }

    /// `POST /stores/my`: update when the body names a store, otherwise
    /// create (multiple mode) or upsert (single mode).
    ///
    /// # Errors
    ///
    /// See [`StoreService::update`], [`StoreService::create`] and
    /// [`StoreService::upsert`].
    pub async fn save(
        &self,
        owner: AccountId,
        mut input: StoreInput,
    ) -> Result<(Store, SaveOutcome), StoreError> {
        if let Some(id) = non_empty(input.id.take()) {
            let store = self.update(owner, &id, input).await?;
            return Ok((store, SaveOutcome::Updated));
        }

        match self.cardinality {
            StoreCardinality::Single => self.upsert(owner, input).await,
            StoreCardinality::Multiple => {
                let store = self.create(owner, input).await?;
                Ok((store, SaveOutcome::Created))
            }
        }
    }

    /// Remove a store the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the id is malformed, unknown, or
    /// owned by someone else.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner: AccountId, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        if !self.stores.delete_owned(owner, id).await? {
            return Err(StoreError::NotFound);
        }
        tracing::info!(store_id = %id, "Store deleted");
        Ok(())
    }
}

/// A write for a vanished owner reads as `NotFound`.
fn owned_write_error(err: RepositoryError) -> StoreError {
    match err {
        RepositoryError::Conflict(msg) => StoreError::Conflict(msg),
        RepositoryError::NotFound => StoreError::NotFound,
        other => StoreError::Repository(other),
    }
}

/// Malformed ids are indistinguishable from unknown ones.
fn parse_id(raw: &str) -> Result<StoreId, StoreError> {
    StoreId::parse_str(raw).map_err(|_| StoreError::NotFound)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned())
}

fn check_coordinate(value: Option<f64>, field: &str, limit: f64) -> Result<(), StoreError> {
    match value {
        Some(v) if !v.is_finite() || v.abs() > limit => Err(StoreError::Validation(format!(
            "{field} must be between -{limit} and {limit}"
        ))),
        _ => Ok(()),
    }
}

fn new_store(input: StoreInput) -> Result<NewStore, StoreError> {
    let name = non_empty(input.name)
        .ok_or_else(|| StoreError::Validation("name is required".to_string()))?;
    let lat = input.lat.flatten();
    let lng = input.lng.flatten();
    check_coordinate(lat, "lat", 90.0)?;
    check_coordinate(lng, "lng", 180.0)?;

    Ok(NewStore {
        name,
        mode: StoreMode::parse_or_default(input.mode.as_deref()),
        description: input.description.unwrap_or_default(),
        logo_url: trimmed(input.logo_url).unwrap_or_default(),
        area: trimmed(input.comuna).unwrap_or_default(),
        category: trimmed(input.tipo_negocio).unwrap_or_default(),
        address: trimmed(input.direccion).unwrap_or_default(),
        lat,
        lng,
        is_active: input.is_active.unwrap_or(true),
    })
}

fn store_changes(input: StoreInput) -> Result<StoreChanges, StoreError> {
    let name = match input.name {
        Some(raw) => Some(
            non_empty(Some(raw))
                .ok_or_else(|| StoreError::Validation("name cannot be empty".to_string()))?,
        ),
        None => None,
    };
    let mode = match input.mode.as_deref() {
        Some(raw) => Some(StoreMode::parse(raw).ok_or_else(|| {
            StoreError::Validation(format!("mode must be products or bookings, got {raw}"))
        })?),
        None => None,
    };
    check_coordinate(input.lat.flatten(), "lat", 90.0)?;
    check_coordinate(input.lng.flatten(), "lng", 180.0)?;

    Ok(StoreChanges {
        name,
        mode,
        description: input.description,
        logo_url: trimmed(input.logo_url),
        area: trimmed(input.comuna),
        category: trimmed(input.tipo_negocio),
        address: trimmed(input.direccion),
        lat: input.lat,
        lng: input.lng,
        is_active: input.is_active,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use vitrinex_core::{AccountRole, Email};

    use super::*;
    use crate::db::Storage;
    use crate::models::NewAccount;

    async fn setup(cardinality: StoreCardinality) -> (StoreService, AccountId, AccountId) {
        let storage = Storage::memory();
        let mut ids = Vec::new();
        for (name, email) in [("alice", "a@x.com"), ("bob", "b@x.com")] {
            let account = storage
                .accounts
                .create(&NewAccount {
                    username: name.to_string(),
                    email: Email::parse(email).unwrap(),
                    role: AccountRole::Standard,
                    password_hash: "$argon2id$fake".to_string(),
                })
                .await
                .unwrap();
            ids.push(account.id);
        }
        (
            StoreService::new(storage.stores, cardinality),
            ids[0],
            ids[1],
        )
    }

    fn input(name: &str) -> StoreInput {
        StoreInput {
            name: Some(name.to_string()),
            ..StoreInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (stores, alice, _) = setup(StoreCardinality::Multiple).await;
        let mut body = input("  Alice Shop ");
        body.mode = Some("catalog".to_string());

        let store = stores.create(alice, body).await.unwrap();
        assert_eq!(store.name, "Alice Shop");
        assert_eq!(store.mode, StoreMode::Products);
        assert!(store.is_active);
        assert_eq!(store.owner_id, alice);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (stores, alice, _) = setup(StoreCardinality::Multiple).await;
        assert!(matches!(
            stores.create(alice, StoreInput::default()).await,
            Err(StoreError::Validation(_))
        ));

        let mut body = input("Shop");
        body.lat = Some(Some(91.0));
        assert!(matches!(
            stores.create(alice, body).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let (stores, alice, _) = setup(StoreCardinality::Multiple).await;
        let mut body = input("Shop");
        body.lat = Some(Some(-33.4));
        let store = stores.create(alice, body).await.unwrap();
        let id = store.id.to_string();

        let bad_mode = StoreInput {
            mode: Some("catalog".to_string()),
            ..StoreInput::default()
        };
        assert!(matches!(
            stores.update(alice, &id, bad_mode).await,
            Err(StoreError::Validation(_))
        ));

        let changes = StoreInput {
            mode: Some("bookings".to_string()),
            lat: Some(None),
            is_active: Some(false),
            ..StoreInput::default()
        };
        let updated = stores.update(alice, &id, changes).await.unwrap();
        assert_eq!(updated.name, "Shop");
        assert_eq!(updated.mode, StoreMode::Bookings);
        assert_eq!(updated.lat, None);
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_foreign_and_malformed_ids_are_not_found() {
        let (stores, alice, bob) = setup(StoreCardinality::Multiple).await;
        let store = stores.create(alice, input("Alice Shop")).await.unwrap();
        let id = store.id.to_string();

        assert!(matches!(
            stores.update(bob, &id, input("Mine now")).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(stores.delete(bob, &id).await, Err(StoreError::NotFound)));
        assert!(matches!(
            stores.delete(alice, "65a1f0c2e4b0a1b2c3d4e5f6").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            stores.get_public("not-an-id").await,
            Err(StoreError::NotFound)
        ));

        assert_eq!(stores.get_public(&id).await.unwrap().name, "Alice Shop");
    }

    #[tokio::test]
    async fn test_save_with_foreign_id_does_not_create() {
        let (stores, alice, bob) = setup(StoreCardinality::Multiple).await;
        let store = stores.create(alice, input("Alice Shop")).await.unwrap();

        let mut body = input("Bob Shop");
        body.id = Some(store.id.to_string());
        assert!(matches!(stores.save(bob, body).await, Err(StoreError::NotFound)));
        assert!(stores.list_mine(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multiple_mode_allows_many() {
        let (stores, alice, _) = setup(StoreCardinality::Multiple).await;
        stores.save(alice, input("One")).await.unwrap();
        stores.save(alice, input("Two")).await.unwrap();

        let mine = stores.list_mine(alice).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name, "Two");
    }

    #[tokio::test]
    async fn test_single_mode_save_upserts() {
        let (stores, alice, _) = setup(StoreCardinality::Single).await;

        let (first, outcome) = stores.save(alice, input("One")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Created);
        let (second, outcome) = stores.save(alice, input("Renamed")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(first.id, second.id);

        assert!(matches!(
            stores.create(alice, input("Another")).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(stores.list_mine(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_mode_save_keeps_omitted_fields() {
        let (stores, alice, _) = setup(StoreCardinality::Single).await;

        assert!(matches!(
            stores.save(alice, StoreInput::default()).await,
            Err(StoreError::Validation(_))
        ));

        let mut body = input("Shop");
        body.mode = Some("bookings".to_string());
        body.lat = Some(Some(-33.4));
        body.comuna = Some("Providencia".to_string());
        body.is_active = Some(false);
        stores.save(alice, body).await.unwrap();

        let (renamed, outcome) = stores.save(alice, input("Renamed")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.mode, StoreMode::Bookings);
        assert_eq!(renamed.lat, Some(-33.4));
        assert_eq!(renamed.area, "Providencia");
        assert!(!renamed.is_active);

        let described = StoreInput {
            description: Some("nuevo".to_string()),
            ..StoreInput::default()
        };
        let (store, _) = stores.save(alice, described).await.unwrap();
        assert_eq!(store.name, "Renamed");
        assert_eq!(store.description, "nuevo");
    }

    #[tokio::test]
    async fn test_save_for_vanished_owner_is_not_found() {
        for cardinality in [StoreCardinality::Multiple, StoreCardinality::Single] {
            let (stores, _, _) = setup(cardinality).await;
            assert!(matches!(
                stores.save(AccountId::generate(), input("Orphan")).await,
                Err(StoreError::NotFound)
            ));
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_upserts_leave_one_store() {
        let (stores, alice, _) = setup(StoreCardinality::Single).await;
        let stores = Arc::new(stores);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let stores = Arc::clone(&stores);
                tokio::spawn(async move { stores.upsert(alice, input(&format!("Shop {i}"))).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            let (_, outcome) = handle.await.unwrap().unwrap();
            if outcome == SaveOutcome::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(stores.list_mine(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_listing_filters() {
        let (stores, alice, bob) = setup(StoreCardinality::Multiple).await;
        let mut cafe = input("Café");
        cafe.comuna = Some("Providencia".to_string());
        cafe.mode = Some("bookings".to_string());
        stores.create(alice, cafe).await.unwrap();

        let mut bakery = input("Panadería");
        bakery.comuna = Some("Ñuñoa".to_string());
        stores.create(bob, bakery).await.unwrap();

        let mut hidden = input("Cerrada");
        hidden.is_active = Some(false);
        let hidden = stores.create(bob, hidden).await.unwrap();

        let all = stores.list_public(StoreQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let bookings = stores
            .list_public(StoreQuery {
                mode: Some("bookings".to_string()),
                ..StoreQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].owner.username, "alice");

        let unknown_mode = stores
            .list_public(StoreQuery {
                mode: Some("catalog".to_string()),
                comuna: Some(String::new()),
                ..StoreQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(unknown_mode.len(), 2);

        // Inactive stores stay reachable by id
        let fetched = stores.get_public(&hidden.id.to_string()).await.unwrap();
        assert!(!fetched.is_active);
    }
}
