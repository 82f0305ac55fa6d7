//! Account and session route handlers.
//!
//! A successful register or login hands the token back only as an `HttpOnly`
//! cookie; the JSON body carries the account projection.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, INVALID_SESSION, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentAccount, expired_session_cookie, session_cookie};
use crate::models::{AccountProfile, LoginRequest, ProfileUpdate, RegisterRequest};
use crate::routes::JsonBody;
use crate::services::AuthError;
use crate::services::auth::Session;
use crate::state::AppState;

/// Respond with the session cookie and the account projection.
fn session_response(state: &AppState, status: StatusCode, session: Session) -> Response {
    let max_age = state.accounts().tokens().ttl().num_seconds();
    let cookie = session_cookie(session.token, max_age, state.config().secure_cookies());

    (
        status,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AccountProfile::from(session.account)),
    )
        .into_response()
}

/// Create an account and log it in.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Response> {
    let session = state.accounts().register(body).await?;
    set_sentry_user(&session.account.id);
    Ok(session_response(&state, StatusCode::CREATED, session))
}

/// Exchange credentials for a session cookie.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Response> {
    let session = state.accounts().login(body).await?;
    set_sentry_user(&session.account.id);
    Ok(session_response(&state, StatusCode::OK, session))
}

/// Clear the session cookie. Always succeeds.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    let cookie = expired_session_cookie(state.config().secure_cookies());
    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Logged out" })),
    )
}

/// Session check used by the browser client on boot. A token whose account
/// is gone is no session at all.
#[instrument(skip(state, current), fields(account_id = %current.0))]
pub async fn verify(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<AccountProfile>> {
    let account = state
        .accounts()
        .profile(current.0)
        .await
        .map_err(|e| match e {
            AuthError::AccountNotFound => AppError::Unauthorized(INVALID_SESSION.to_string()),
            other => other.into(),
        })?;
    Ok(Json(account.into()))
}

#[instrument(skip(state, current), fields(account_id = %current.0))]
pub async fn profile(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<AccountProfile>> {
    let account = state.accounts().profile(current.0).await?;
    Ok(Json(account.into()))
}

/// Update any subset of the caller's profile fields.
#[instrument(skip(state, current, body), fields(account_id = %current.0))]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentAccount,
    JsonBody(body): JsonBody<ProfileUpdate>,
) -> Result<Json<AccountProfile>> {
    let account = state.accounts().update_profile(current.0, body).await?;
    Ok(Json(account.into()))
}
