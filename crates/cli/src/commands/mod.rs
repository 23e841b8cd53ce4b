//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;

use thiserror::Error;

use verdant_storefront::config::ConfigError;

/// Errors surfaced by any subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Catalog(#[from] serde_yaml::Error),

    #[error("{0} catalog validation errors found")]
    Validation(usize),
}
