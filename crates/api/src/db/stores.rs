//! `PostgreSQL` store repository.
//!
//! Ownership is enforced in SQL: every owner-scoped statement carries both
//! `id = $n AND owner_id = $m`, so there is no read-then-check window.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use vitrinex_core::{AccountId, StoreId};

use super::{RepositoryError, StoreRepository, conflict_on_unique};
use crate::config::StoreCardinality;
use crate::models::{
    NewStore, PublicStore, PublicStoreRow, Store, StoreChanges, StoreFilter, StoreRow,
};

const STORE_COLUMNS: &str = "id, owner_id, name, mode, description, logo_url, area, category, \
                             address, lat, lng, is_active, created_at, updated_at";

const PUBLIC_STORE_SELECT: &str = "SELECT s.id, s.owner_id, s.name, s.mode, s.description, \
     s.logo_url, s.area, s.category, s.address, s.lat, s.lng, s.is_active, s.created_at, \
     s.updated_at, a.username AS owner_username, a.avatar_url AS owner_avatar_url \
     FROM vitrinex.store s JOIN vitrinex.account a ON a.id = s.owner_id";

/// The slot every single-mode store occupies.
const SINGLE_SLOT: i16 = 0;

const UNSLOTTED_STORES: &str =
    "account has stores created in multiple-store mode; migrate them before saving a single store";

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    store: StoreRow,
    inserted: bool,
}

/// Store repository backed by `vitrinex.store`.
#[derive(Clone)]
pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_store_values(query: &mut QueryBuilder<'_, Postgres>, store: &NewStore) {
    let mut values = query.separated(", ");
    values
        .push_bind(store.name.clone())
        .push_bind(store.mode.as_str())
        .push_bind(store.description.clone())
        .push_bind(store.logo_url.clone())
        .push_bind(store.area.clone())
        .push_bind(store.category.clone())
        .push_bind(store.address.clone())
        .push_bind(store.lat)
        .push_bind(store.lng)
        .push_bind(store.is_active);
}

/// `, column = $n` for every field `changes` carries.
fn push_store_changes(query: &mut QueryBuilder<'_, Postgres>, changes: &StoreChanges) {
    if let Some(name) = &changes.name {
        query.push(", name = ").push_bind(name.clone());
    }
    if let Some(mode) = changes.mode {
        query.push(", mode = ").push_bind(mode.as_str());
    }
    if let Some(description) = &changes.description {
        query.push(", description = ").push_bind(description.clone());
    }
    if let Some(logo_url) = &changes.logo_url {
        query.push(", logo_url = ").push_bind(logo_url.clone());
    }
    if let Some(area) = &changes.area {
        query.push(", area = ").push_bind(area.clone());
    }
    if let Some(category) = &changes.category {
        query.push(", category = ").push_bind(category.clone());
    }
    if let Some(address) = &changes.address {
        query.push(", address = ").push_bind(address.clone());
    }
    if let Some(lat) = changes.lat {
        query.push(", lat = ").push_bind(lat);
    }
    if let Some(lng) = changes.lng {
        query.push(", lng = ").push_bind(lng);
    }
    if let Some(is_active) = changes.is_active {
        query.push(", is_active = ").push_bind(is_active);
    }
}

/// `, column = EXCLUDED.column` for every field `changes` carries.
fn push_excluded_changes(query: &mut QueryBuilder<'_, Postgres>, changes: &StoreChanges) {
    let present = [
        ("name", changes.name.is_some()),
        ("mode", changes.mode.is_some()),
        ("description", changes.description.is_some()),
        ("logo_url", changes.logo_url.is_some()),
        ("area", changes.area.is_some()),
        ("category", changes.category.is_some()),
        ("address", changes.address.is_some()),
        ("lat", changes.lat.is_some()),
        ("lng", changes.lng.is_some()),
        ("is_active", changes.is_active.is_some()),
    ];
    for (column, _) in present.into_iter().filter(|(_, sent)| *sent) {
        query.push(format!(", {column} = EXCLUDED.{column}"));
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    #[instrument(skip(self))]
    async fn list_public(&self, filter: &StoreFilter) -> Result<Vec<PublicStore>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(PUBLIC_STORE_SELECT);
        query.push(" WHERE s.is_active");

        if let Some(area) = &filter.area {
            query.push(" AND s.area = ").push_bind(area.clone());
        }
        if let Some(category) = &filter.category {
            query.push(" AND s.category = ").push_bind(category.clone());
        }
        if let Some(mode) = filter.mode {
            query.push(" AND s.mode = ").push_bind(mode.as_str());
        }
        query.push(" ORDER BY s.created_at DESC");

        query
            .build_query_as::<PublicStoreRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PublicStore::try_from)
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_public(&self, id: StoreId) -> Result<Option<PublicStore>, RepositoryError> {
        sqlx::query_as::<_, PublicStoreRow>(&format!("{PUBLIC_STORE_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PublicStore::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_owned(&self, owner: AccountId) -> Result<Vec<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM vitrinex.store WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Store::try_from)
        .collect()
    }

    #[instrument(skip(self, store), fields(name = %store.name))]
    async fn create(
        &self,
        owner: AccountId,
        store: &NewStore,
        cardinality: StoreCardinality,
    ) -> Result<Store, RepositoryError> {
        let slot = match cardinality {
            StoreCardinality::Single => Some(SINGLE_SLOT),
            StoreCardinality::Multiple => None,
        };

        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO vitrinex.store (id, owner_id, owner_slot, name, mode, description, \
             logo_url, area, category, address, lat, lng, is_active) VALUES (",
        );
        query
            .push_bind(StoreId::generate())
            .push(", ")
            .push_bind(owner)
            .push(", ")
            .push_bind(slot)
            .push(", ");
        push_store_values(&mut query, store);
        query.push(") RETURNING ").push(STORE_COLUMNS);

        let row = query
            .build_query_as::<StoreRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "account already owns a store"))?;

        Store::try_from(row)
    }

    #[instrument(skip(self, changes))]
    async fn upsert_single(
        &self,
        owner: AccountId,
        changes: &StoreChanges,
    ) -> Result<Option<(Store, bool)>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE vitrinex.store SET updated_at = now()");
        push_store_changes(&mut query, changes);
        query
            .push(" WHERE owner_id = ")
            .push_bind(owner)
            .push(" AND owner_slot = ")
            .push_bind(SINGLE_SLOT)
            .push(" RETURNING ")
            .push(STORE_COLUMNS);

        if let Some(row) = query
            .build_query_as::<StoreRow>()
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Some((Store::try_from(row)?, false)));
        }

        let Some(draft) = changes.to_new_store() else {
            return Ok(None);
        };

        // Concurrent first saves meet on the slot; the loser updates the
        // winner's row with only its own fields.
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO vitrinex.store (id, owner_id, owner_slot, name, mode, description, \
             logo_url, area, category, address, lat, lng, is_active) SELECT ",
        );
        query
            .push_bind(StoreId::generate())
            .push(", ")
            .push_bind(owner)
            .push(", ")
            .push_bind(SINGLE_SLOT)
            .push(", ");
        push_store_values(&mut query, &draft);
        query
            .push(
                " WHERE NOT EXISTS (SELECT 1 FROM vitrinex.store \
                 WHERE owner_id = ",
            )
            .push_bind(owner)
            .push(
                " AND owner_slot IS NULL) \
                 ON CONFLICT (owner_id, owner_slot) DO UPDATE SET updated_at = now()",
            );
        push_excluded_changes(&mut query, changes);
        query
            .push(" RETURNING ")
            .push(STORE_COLUMNS)
            .push(", (xmax = 0) AS inserted");

        let row = query
            .build_query_as::<UpsertRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "account already owns a store"))?
            .ok_or_else(|| RepositoryError::Conflict(UNSLOTTED_STORES.to_owned()))?;

        Ok(Some((Store::try_from(row.store)?, row.inserted)))
    }

    #[instrument(skip(self, changes))]
    async fn update_owned(
        &self,
        owner: AccountId,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Option<Store>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE vitrinex.store SET updated_at = now()");
        push_store_changes(&mut query, changes);
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner_id = ")
            .push_bind(owner)
            .push(" RETURNING ")
            .push(STORE_COLUMNS);

        query
            .build_query_as::<StoreRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(Store::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn delete_owned(&self, owner: AccountId, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM vitrinex.store WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
