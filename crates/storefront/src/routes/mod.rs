//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /products               - Filtered product listing
//! GET  /products/{id}          - Product detail
//!
//! # Orders
//! POST /orders                 - Record a payment confirmation (idempotent)
//! GET  /orders/mine            - Signed-in customer's orders
//! POST /orders/by-email        - Orders for a bearer-verified email (rate limited)
//! GET  /orders/{id}            - One of the signed-in customer's orders
//!
//! # Stats
//! GET  /stats?range=...        - Sales statistics
//!
//! # Auth (rate limited)
//! POST /auth/session           - Exchange a bearer token for a session
//! POST /auth/logout            - End the session
//! ```

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod stats;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, order_lookup_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
fn auth_routes(rate_limited: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/session", post(auth::create_session))
        .route("/logout", post(auth::logout));

    if rate_limited {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the product routes router.
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the order routes router.
///
/// Only the email lookup is limited; it is the route a stolen token would be
/// replayed against.
fn order_routes(rate_limited: bool) -> Router<AppState> {
    let by_email = Router::new().route("/by-email", post(orders::by_email));
    let by_email = if rate_limited {
        by_email.layer(order_lookup_rate_limiter())
    } else {
        by_email
    };

    Router::new()
        .route("/", post(orders::create))
        .route("/mine", get(orders::mine))
        .route("/{id}", get(orders::show))
        .merge(by_email)
}

fn build(rate_limited: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/orders", order_routes(rate_limited))
        .route("/stats", get(stats::show))
        .nest("/auth", auth_routes(rate_limited))
}

/// Create all routes for the storefront, without rate limiting.
///
/// The limiters key on client IP headers, which in-process requests lack.
pub fn routes() -> Router<AppState> {
    build(false)
}

/// Create all routes for the storefront, with per-IP rate limits on the
/// auth and email-lookup routes.
pub fn routes_with_rate_limits() -> Router<AppState> {
    build(true)
}
