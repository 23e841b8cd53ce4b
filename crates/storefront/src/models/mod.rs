//! Domain models for the storefront.
//!
//! These are validated domain types, separate from database row types and
//! from raw request payloads.

pub mod identity;
pub mod order;
pub mod product;
pub mod session;
pub mod stats;

pub use identity::{OwnershipPredicate, ReconciledIdentity, VerifiedUser};
pub use order::{LineItem, NewOrder, Order, RecordedOrder};
pub use product::{CatalogProduct, PageWindow, Product, ProductPage, ProductQuery, ProductSort};
pub use session::{CurrentUser, keys as session_keys};
pub use stats::{DailyBucket, StatsWindow};
