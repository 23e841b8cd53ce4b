//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `orders` - Idempotent order intake and ownership-scoped reads
//! - `identity` - Caller identity reconciliation for order reads
//! - `auth_provider` - HTTP client for the hosted auth provider
//! - `stats` - Sales statistics and daily rollups
//! - `catalog` - Product filtering, pagination and decoration
//!
//! Services depend on repository traits, never on a concrete store, so every
//! service runs unchanged against the in-memory repositories in tests.

pub mod auth_provider;
pub mod catalog;
pub mod identity;
pub mod orders;
pub mod stats;

pub use auth_provider::AuthProviderClient;
pub use catalog::{CatalogPage, ProductFilterEngine, ProductQueryParams};
pub use identity::{IdentityError, IdentityProvider, IdentityReconciler, IdentityRequest};
pub use orders::{OrderConfirmation, OrderError, OrderStore};
pub use stats::{StatsAggregator, StatsRange};
