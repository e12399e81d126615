//! HTTP middleware and extractors for the storefront API.
//!
//! # Middleware Order (outermost first, as layered in `main`)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and echoed back)
//! 4. Rate limiting (governor, per client IP)

pub mod auth;
pub mod cookies;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SessionCookies, read_cookie};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
