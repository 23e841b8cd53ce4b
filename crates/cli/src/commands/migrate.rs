//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront schema migrations and create the session table
//! verdant migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_DATABASE_PASSWORD` - Optional password override
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/`

use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use verdant_storefront::config::DataStoreConfig;
use verdant_storefront::db;

use super::CommandError;

/// Run storefront database migrations.
///
/// The session table lives in its own `tower_sessions` schema and is created
/// by the session store itself.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or a migration fails.
pub async fn storefront() -> Result<(), CommandError> {
    let config = DataStoreConfig::from_env()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&config).await?;

    info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    info!("Storefront migrations complete!");
    Ok(())
}
