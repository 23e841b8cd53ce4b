//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `AUTH_PROVIDER_URL` - Base URL of the hosted auth provider
//! - `AUTH_PROVIDER_API_KEY` - Project API key sent to the auth provider
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_PASSWORD` - Overrides the password in the connection string
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_REPORTING_TIME_ZONE` - IANA zone for daily rollups (default: Europe/Paris)
//! - `STOREFRONT_DB_STATEMENT_TIMEOUT_SECS` - Server-side statement timeout (default: 10)
//! - `STOREFRONT_STATS_TOKEN` - Bearer token required by `GET /stats` when set
//! - `AUTH_PROVIDER_TIMEOUT_SECS` - Auth provider request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Relational data store connection
    pub database: DataStoreConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Zone whose calendar days bound the daily rollups
    pub reporting_time_zone: Tz,
    /// Auth provider connection
    pub auth: AuthProviderConfig,
    /// Bearer token guarding `GET /stats`; open when unset
    pub stats_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Data store connection settings.
///
/// `SecretString` redacts both fields in `Debug` output.
#[derive(Debug, Clone)]
pub struct DataStoreConfig {
    /// Connection URL (may embed a password)
    pub endpoint: SecretString,
    /// Password overriding the one in `endpoint`
    pub credential: Option<SecretString>,
    /// Server-side `statement_timeout` applied to every connection
    pub statement_timeout: Duration,
}

/// Hosted auth provider settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AuthProviderConfig {
    /// Provider base URL, e.g. `https://project.auth.example`
    pub base_url: Url,
    /// Project API key sent as the `apikey` header
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for AuthProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProviderConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database = DataStoreConfig::from_env()?;
        let host = parse_env(
            "STOREFRONT_HOST",
            &get_env_or_default("STOREFRONT_HOST", "127.0.0.1"),
        )?;
        let port = parse_env("STOREFRONT_PORT", &get_env_or_default("STOREFRONT_PORT", "3000"))?;
        let base_url = parse_env(
            "STOREFRONT_BASE_URL",
            &get_required_env("STOREFRONT_BASE_URL")?,
        )?;
        let reporting_time_zone = parse_env(
            "STOREFRONT_REPORTING_TIME_ZONE",
            &get_env_or_default("STOREFRONT_REPORTING_TIME_ZONE", "Europe/Paris"),
        )?;
        let auth = AuthProviderConfig::from_env()?;
        let stats_token = get_optional_env("STOREFRONT_STATS_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "STOREFRONT_STATS_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            database,
            host,
            port,
            base_url,
            reporting_time_zone,
            auth,
            stats_token,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DataStoreConfig {
    /// Load only the database settings.
    ///
    /// Used on its own by tools that never serve requests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the endpoint is missing or the timeout is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_database_url("STOREFRONT_DATABASE_URL")?,
            credential: get_optional_env("STOREFRONT_DATABASE_PASSWORD").map(SecretString::from),
            statement_timeout: get_duration_secs("STOREFRONT_DB_STATEMENT_TIMEOUT_SECS", 10)?,
        })
    }
}

impl AuthProviderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_env("AUTH_PROVIDER_URL", &get_required_env("AUTH_PROVIDER_URL")?)?,
            api_key: get_validated_secret("AUTH_PROVIDER_API_KEY")?,
            timeout: get_duration_secs("AUTH_PROVIDER_TIMEOUT_SECS", 10)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a raw value, reporting failures against `key`.
fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read a whole number of seconds, rejecting zero.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = match get_optional_env(key) {
        Some(raw) => parse_env(key, &raw)?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Bits of entropy per character, from the character frequencies of `value`.
fn entropy_per_char(value: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .into_values()
        .map(|n| {
            let share = f64::from(n) / total;
            -share * share.log2()
        })
        .sum()
}

/// Why `value` should not be trusted as a credential, if anything.
fn weakness(value: &str) -> Option<String> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Some(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let bits = entropy_per_char(value);
    (bits < MIN_ENTROPY_BITS_PER_CHAR).then(|| {
        format!(
            "only {bits:.2} bits/char of entropy, at least {MIN_ENTROPY_BITS_PER_CHAR:.1} expected"
        )
    })
}

/// Reject `value` when it is too weak to guard `key`.
fn validate_secret_strength(value: &str, key: &str) -> Result<(), ConfigError> {
    weakness(value).map_or(Ok(()), |reason| {
        Err(ConfigError::InsecureSecret(key.to_string(), reason))
    })
}

/// Read a required credential and check its strength.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
