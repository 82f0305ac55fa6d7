//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness
//! GET    /health/ready           - Readiness (storage reachable)
//!
//! # Auth (register and login are rate limited)
//! POST   /api/auth/register      - Create account, set session cookie
//! POST   /api/auth/login         - Check credentials, set session cookie
//! POST   /api/auth/logout        - Clear session cookie
//! GET    /api/auth/verify        - Session check (session)
//! GET    /api/auth/profile       - Own profile (session)
//! PUT    /api/auth/profile       - Update own profile (session)
//!
//! # Stores
//! GET    /api/stores             - Active stores (filters: comuna, tipoNegocio, mode)
//! GET    /api/stores/{id}        - One store, public projection
//! GET    /api/stores/my          - Own stores (session, alias /me)
//! POST   /api/stores/my          - Create, upsert or update own store (session)
//! PUT    /api/stores/my/{id}     - Update own store (session)
//! DELETE /api/stores/my/{id}     - Delete own store (session)
//! ```

pub mod auth;
pub mod stores;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    middleware::{from_fn_with_state, map_response},
    routing::{get, post, put},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, rate_limited_as_json, require_session};
use crate::state::AppState;

/// JSON request body whose rejections use the API error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// Create the auth routes router.
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let mut credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    if state.config().rate_limit {
        match auth_rate_limiter() {
            Some(limiter) => {
                credentials = credentials
                    .layer(limiter)
                    .layer(map_response(rate_limited_as_json));
            }
            None => tracing::warn!("Rate limiter rejected its quota, credential routes unlimited"),
        }
    }

    let session = Router::new()
        .route("/verify", get(auth::verify))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/logout", post(auth::logout))
        .merge(credentials)
        .merge(session)
}

/// Create the store routes router.
pub fn store_routes(state: &AppState) -> Router<AppState> {
    let owned = Router::new()
        .route("/my", get(stores::mine).post(stores::save))
        .route("/me", get(stores::mine))
        .route("/my/{id}", put(stores::update).delete(stores::delete))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(stores::index))
        .route("/{id}", get(stores::show))
        .merge(owned)
}

/// Create all API routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes(state))
        .nest("/api/stores", store_routes(state))
}
