//! Application state shared across handlers.

use std::sync::Arc;

use chrono_tz::Tz;
use secrecy::SecretString;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{OrderRepository, PgOrderRepository, PgProductRepository, ProductRepository};
use crate::services::{
    AuthProviderClient, IdentityError, IdentityProvider, IdentityReconciler, OrderStore,
    ProductFilterEngine, StatsAggregator,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every service behind it was
/// built from explicit configuration; none reads process state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    orders: OrderStore,
    identity: IdentityReconciler,
    identity_provider: Arc<dyn IdentityProvider>,
    stats: StatsAggregator,
    catalog: ProductFilterEngine,
    stats_token: Option<SecretString>,
    pool: Option<PgPool>,
}

/// The collaborators an [`AppState`] is assembled from.
pub struct AppParts {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub reporting_time_zone: Tz,
    pub stats_token: Option<SecretString>,
    /// Checked by the readiness probe when present.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Create the production state: `PostgreSQL` repositories and the hosted
    /// auth provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth provider client cannot be built.
    pub fn new(config: &StorefrontConfig, pool: PgPool) -> Result<Self, IdentityError> {
        let provider = AuthProviderClient::new(&config.auth)?;

        Ok(Self::from_parts(AppParts {
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            identity_provider: Arc::new(provider),
            reporting_time_zone: config.reporting_time_zone,
            stats_token: config.stats_token.clone(),
            pool: Some(pool),
        }))
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn from_parts(parts: AppParts) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orders: OrderStore::new(Arc::clone(&parts.orders)),
                identity: IdentityReconciler::new(Arc::clone(&parts.identity_provider)),
                identity_provider: parts.identity_provider,
                stats: StatsAggregator::new(parts.orders, parts.reporting_time_zone),
                catalog: ProductFilterEngine::new(parts.products),
                stats_token: parts.stats_token,
                pool: parts.pool,
            }),
        }
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityReconciler {
        &self.inner.identity
    }

    /// The auth provider, for exchanging bearer tokens for sessions.
    #[must_use]
    pub fn identity_provider(&self) -> &dyn IdentityProvider {
        self.inner.identity_provider.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &StatsAggregator {
        &self.inner.stats
    }

    #[must_use]
    pub fn catalog(&self) -> &ProductFilterEngine {
        &self.inner.catalog
    }

    /// Token required by `GET /stats`, if any.
    #[must_use]
    pub fn stats_token(&self) -> Option<&SecretString> {
        self.inner.stats_token.as_ref()
    }

    /// Get a reference to the database connection pool, when running on one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
