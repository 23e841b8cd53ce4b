//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `order` - Confirmed orders, unique on `payment_session_id`
//! - `product` - Plant catalog (managed outside the storefront)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Repositories
//!
//! Each table is reached through an object-safe repository trait with a
//! `PostgreSQL` implementation and an in-memory implementation. The in-memory
//! stores enforce the same uniqueness and ordering rules as the SQL ones.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

pub use memory::{InMemoryOrderRepository, InMemoryProductRepository};
pub use orders::{OrderRepository, OrderSnapshot, OrderTotals, PgOrderRepository};
pub use products::{PgProductRepository, ProductRepository};

use crate::config::DataStoreConfig;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate payment session).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-key violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Every statement runs under a server-side `statement_timeout`, and acquiring
/// a connection is bounded too, so a stalled database surfaces as an error
/// rather than a hung request.
///
/// # Errors
///
/// Returns `sqlx::Error` if the endpoint cannot be parsed or the connection
/// cannot be established.
pub async fn create_pool(config: &DataStoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(config)?)
        .await
}

/// Build connection options from the endpoint URL and optional credential.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if the endpoint is not a valid URL.
pub fn connect_options(config: &DataStoreConfig) -> Result<PgConnectOptions, sqlx::Error> {
    let mut options: PgConnectOptions = config.endpoint.expose_secret().parse()?;
    if let Some(credential) = &config.credential {
        options = options.password(credential.expose_secret());
    }
    let timeout_ms = config.statement_timeout.as_millis().to_string();
    Ok(options.options([("statement_timeout", timeout_ms.as_str())]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_connect_options_rejects_garbage_endpoint() {
        let config = DataStoreConfig {
            endpoint: SecretString::from("not a url"),
            credential: None,
            statement_timeout: Duration::from_secs(5),
        };
        assert!(connect_options(&config).is_err());
    }

    #[test]
    fn test_connect_options_accepts_credential_override() {
        let config = DataStoreConfig {
            endpoint: SecretString::from("postgres://verdant@localhost:5432/verdant"),
            credential: Some(SecretString::from("s3cr3t-Value")),
            statement_timeout: Duration::from_secs(5),
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_database(), Some("verdant"));
    }
}
