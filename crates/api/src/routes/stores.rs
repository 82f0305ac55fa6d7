//! Store route handlers.
//!
//! Public reads go through the public projection. Everything under `/my`
//! is scoped to the session's account; a store owned by someone else looks
//! exactly like one that does not exist.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::CurrentAccount;
use crate::models::{PublicStore, Store, StoreInput, StoreQuery};
use crate::routes::JsonBody;
use crate::services::SaveOutcome;
use crate::state::AppState;

/// Active stores, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Vec<PublicStore>>> {
    Ok(Json(state.stores().list_public(query).await?))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicStore>> {
    Ok(Json(state.stores().get_public(&id).await?))
}

/// The caller's stores. Always an array, possibly empty.
#[instrument(skip(state, current), fields(account_id = %current.0))]
pub async fn mine(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<Vec<Store>>> {
    Ok(Json(state.stores().list_mine(current.0).await?))
}

/// Create, upsert or update depending on the body and deployment mode.
///
/// 201 when a row was created, 200 when an existing one changed.
#[instrument(skip(state, current, input), fields(account_id = %current.0))]
pub async fn save(
    State(state): State<AppState>,
    current: CurrentAccount,
    JsonBody(input): JsonBody<StoreInput>,
) -> Result<impl IntoResponse> {
    let (store, outcome) = state.stores().save(current.0, input).await?;
    let status = match outcome {
        SaveOutcome::Created => StatusCode::CREATED,
        SaveOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(store)))
}

#[instrument(skip(state, current, input), fields(account_id = %current.0))]
pub async fn update(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<StoreInput>,
) -> Result<Json<Store>> {
    Ok(Json(state.stores().update(current.0, &id, input).await?))
}

#[instrument(skip(state, current), fields(account_id = %current.0))]
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.stores().delete(current.0, &id).await?;
    Ok(Json(json!({ "message": "Store deleted" })))
}
