//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction naming)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (records the ID on the span and the response)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Rate limiting (governor, on `/auth/*` and email order lookups)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{BearerToken, OptionalAuth, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, order_lookup_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, postgres_session_store};
