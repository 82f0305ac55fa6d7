//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `CatchPanicLayer` (panics become 500s)
//! 3. `TraceLayer` (request span)
//! 4. CORS (single credentialed origin)
//! 5. Request ID (recorded into the request span)
//! 6. Security headers
//! 7. Session guard (`require_session`, authenticated routes only)
//! 8. Rate limiting (governor, credential routes only)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use rate_limit::{auth_rate_limiter, rate_limited_as_json};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{
    CurrentAccount, SESSION_COOKIE_NAME, expired_session_cookie, require_session, session_cookie,
    session_token,
};
