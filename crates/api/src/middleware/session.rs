//! Cookie-carried sessions.
//!
//! The session token travels in an `HttpOnly` cookie. `require_session` guards
//! the authenticated routes: it checks the token's signature and expiry only,
//! without touching storage, and leaves a [`CurrentAccount`] in the request
//! extensions for handlers to extract.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite, time::OffsetDateTime};

use vitrinex_core::AccountId;

use crate::error::{AppError, INVALID_SESSION, NOT_AUTHENTICATED};
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "token";

/// Build the cookie that carries a freshly issued token.
#[must_use]
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(cookie::time::Duration::seconds(max_age_seconds))
        .build()
}

/// Build a cookie that makes the browser drop the session.
#[must_use]
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Session token from the request's `Cookie` headers, if any.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// The account id carried by a verified session cookie. The account itself
/// may have been deleted since the token was issued.
#[derive(Debug, Clone, Copy)]
pub struct CurrentAccount(pub AccountId);

/// Reject requests without a valid session cookie.
///
/// On success the token's subject is stored as a [`CurrentAccount`]
/// extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;

    let account_id = state
        .accounts()
        .verify_session(&token)
        .map_err(|_| AppError::Unauthorized(INVALID_SESSION.to_string()))?;

    tracing::Span::current().record("account_id", tracing::field::display(account_id));
    request.extensions_mut().insert(CurrentAccount(account_id));

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let rendered = session_cookie("abc".to_string(), 3600, false).to_string();
        assert!(rendered.starts_with("token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_follows_environment() {
        let rendered = session_cookie("abc".to_string(), 60, true).to_string();
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let rendered = expired_session_cookie(false).to_string();
        assert!(rendered.starts_with("token=;"));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("1970"));
    }

    #[test]
    fn test_session_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=xyz; lang=es"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert!(session_token(&headers).is_none());
    }
}
