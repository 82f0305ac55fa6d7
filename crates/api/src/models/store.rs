//! Store models.
//!
//! On the wire the location fields keep the names the SPA uses (`comuna`,
//! `tipoNegocio`, `direccion`); internally they are `area`, `category` and
//! `address`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use vitrinex_core::{AccountId, StoreId, StoreMode};

use crate::db::RepositoryError;

/// A store, as seen by its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub owner_id: AccountId,
    pub name: String,
    pub mode: StoreMode,
    pub description: String,
    pub logo_url: String,
    #[serde(rename = "comuna")]
    pub area: String,
    #[serde(rename = "tipoNegocio")]
    pub category: String,
    #[serde(rename = "direccion")]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for `vitrinex.store`.
#[derive(Debug, sqlx::FromRow)]
pub struct StoreRow {
    pub id: StoreId,
    pub owner_id: AccountId,
    pub name: String,
    pub mode: String,
    pub description: String,
    pub logo_url: String,
    pub area: String,
    pub category: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let mode = StoreMode::parse(&row.mode).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid store mode in database: {}", row.mode))
        })?;

        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            mode,
            description: row.description,
            logo_url: row.logo_url,
            area: row.area,
            category: row.category,
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The owner fields shown next to a public store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOwner {
    pub username: String,
    pub avatar_url: String,
}

/// Public projection of a store: no owner id, no owner email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStore {
    pub id: StoreId,
    pub name: String,
    pub mode: StoreMode,
    pub description: String,
    pub logo_url: String,
    #[serde(rename = "comuna")]
    pub area: String,
    #[serde(rename = "tipoNegocio")]
    pub category: String,
    #[serde(rename = "direccion")]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub owner: StoreOwner,
}

impl PublicStore {
    #[must_use]
    pub fn new(store: Store, owner: StoreOwner) -> Self {
        Self {
            id: store.id,
            name: store.name,
            mode: store.mode,
            description: store.description,
            logo_url: store.logo_url,
            area: store.area,
            category: store.category,
            address: store.address,
            lat: store.lat,
            lng: store.lng,
            is_active: store.is_active,
            created_at: store.created_at,
            owner,
        }
    }
}

/// A store row joined with its owner's public fields.
#[derive(Debug, sqlx::FromRow)]
pub struct PublicStoreRow {
    #[sqlx(flatten)]
    pub store: StoreRow,
    pub owner_username: String,
    pub owner_avatar_url: String,
}

impl TryFrom<PublicStoreRow> for PublicStore {
    type Error = RepositoryError;

    fn try_from(row: PublicStoreRow) -> Result<Self, Self::Error> {
        let owner = StoreOwner {
            username: row.owner_username,
            avatar_url: row.owner_avatar_url,
        };
        Ok(Self::new(Store::try_from(row.store)?, owner))
    }
}

/// Validated fields for a new store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStore {
    pub name: String,
    pub mode: StoreMode,
    pub description: String,
    pub logo_url: String,
    pub area: String,
    pub category: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
}

/// Validated partial update. `lat`/`lng` distinguish "not sent" (`None`)
/// from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub mode: Option<StoreMode>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub area: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub lat: Option<Option<f64>>,
    pub lng: Option<Option<f64>>,
    pub is_active: Option<bool>,
}

impl StoreChanges {
    /// The row to insert when these changes create a store: omitted fields
    /// take their column defaults. `None` without a name.
    #[must_use]
    pub fn to_new_store(&self) -> Option<NewStore> {
        Some(NewStore {
            name: self.name.clone()?,
            mode: self.mode.unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            logo_url: self.logo_url.clone().unwrap_or_default(),
            area: self.area.clone().unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            lat: self.lat.flatten(),
            lng: self.lng.flatten(),
            is_active: self.is_active.unwrap_or(true),
        })
    }

    /// Overwrite the fields of `store` that these changes carry.
    pub fn apply_to(&self, store: &mut Store) {
        if let Some(name) = &self.name {
            store.name.clone_from(name);
        }
        if let Some(mode) = self.mode {
            store.mode = mode;
        }
        if let Some(description) = &self.description {
            store.description.clone_from(description);
        }
        if let Some(logo_url) = &self.logo_url {
            store.logo_url.clone_from(logo_url);
        }
        if let Some(area) = &self.area {
            store.area.clone_from(area);
        }
        if let Some(category) = &self.category {
            store.category.clone_from(category);
        }
        if let Some(address) = &self.address {
            store.address.clone_from(address);
        }
        if let Some(lat) = self.lat {
            store.lat = lat;
        }
        if let Some(lng) = self.lng {
            store.lng = lng;
        }
        if let Some(is_active) = self.is_active {
            store.is_active = is_active;
        }
    }
}

/// Exact-match filters for the public listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreFilter {
    pub area: Option<String>,
    pub category: Option<String>,
    pub mode: Option<StoreMode>,
}

impl StoreFilter {
    #[must_use]
    pub fn matches(&self, store: &Store) -> bool {
        self.area.as_ref().is_none_or(|a| *a == store.area)
            && self.category.as_ref().is_none_or(|c| *c == store.category)
            && self.mode.is_none_or(|m| m == store.mode)
    }
}

/// Query string of `GET /api/stores`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuery {
    pub comuna: Option<String>,
    pub tipo_negocio: Option<String>,
    pub mode: Option<String>,
}

/// Store request body, as sent by the SPA. Validated by the store service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInput {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub comuna: Option<String>,
    pub tipo_negocio: Option<String>,
    pub direccion: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub lng: Option<Option<f64>>,
    pub is_active: Option<bool>,
}

/// Keeps a present-but-null field apart from a missing one.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
