//! In-memory repositories.
//!
//! Used by tests and by local runs without a database. They enforce the same
//! uniqueness and ordering rules as the `PostgreSQL` repositories.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use verdant_core::{OrderId, ProductId};

use super::{OrderRepository, OrderSnapshot, OrderTotals, ProductRepository, RepositoryError};
use crate::models::{
    NewOrder, Order, OwnershipPredicate, Product, ProductPage, ProductQuery, ProductSort,
};

fn in_window(created_at: DateTime<Utc>, since: Option<DateTime<Utc>>) -> bool {
    since.is_none_or(|since| created_at >= since)
}

/// In-memory order repository
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<OrderId, Order>>,
    next_id: AtomicI32,
}

impl InMemoryOrderRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Insert an order with an explicit creation time (for testing purposes).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment session already has
    /// an order.
    pub async fn insert_at(
        &self,
        order: &NewOrder,
        created_at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders
            .values()
            .any(|o| o.payment_session_id == order.payment_session_id)
        {
            return Err(RepositoryError::Conflict(
                "order for payment session already exists".to_string(),
            ));
        }

        let id = OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = Order {
            id,
            payment_session_id: order.payment_session_id.clone(),
            user_id: order.user_id,
            customer_email: order.customer_email.clone(),
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_address: order.customer_address.clone(),
            total_amount: order.total_amount,
            currency: order.currency,
            items: order.items.clone(),
            payment_status: order.payment_status.clone(),
            order_status: order.order_status.clone(),
            metadata: order.metadata.clone(),
            created_at,
            updated_at: created_at,
        };
        orders.insert(id, stored.clone());
        Ok(stored)
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether no order has been stored.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    async fn label_counts<F>(&self, since: Option<DateTime<Utc>>, label: F) -> Vec<(String, u64)>
    where
        F: Fn(&Order) -> &str + Send,
    {
        let orders = self.orders.read().await;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for order in orders.values().filter(|o| in_window(o.created_at, since)) {
            *counts.entry(label(order).to_string()).or_default() += 1;
        }
        counts.into_iter().collect()
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.payment_session_id == payment_session_id)
            .cloned())
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        self.insert_at(order, Utc::now()).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_by_ownership(
        &self,
        predicate: &OwnershipPredicate,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| predicate.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching)
    }

    async fn totals(&self, since: Option<DateTime<Utc>>) -> Result<OrderTotals, RepositoryError> {
        let orders = self.orders.read().await;
        let mut totals = OrderTotals::default();
        for order in orders.values().filter(|o| in_window(o.created_at, since)) {
            totals.total_orders += 1;
            if order.payment_status.counts_as_revenue() {
                totals.paid_revenue = totals.paid_revenue.saturating_add(order.total_amount);
            }
        }
        Ok(totals)
    }

    async fn order_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError> {
        Ok(self.label_counts(since, |o| o.order_status.as_str()).await)
    }

    async fn payment_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError> {
        Ok(self.label_counts(since, |o| o.payment_status.as_str()).await)
    }

    async fn snapshots(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut window: Vec<&Order> = orders
            .values()
            .filter(|o| in_window(o.created_at, since))
            .collect();
        window.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(window
            .into_iter()
            .map(|o| OrderSnapshot {
                created_at: o.created_at,
                total_amount: o.total_amount,
                payment_status: o.payment_status.clone(),
            })
            .collect())
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|o| o.created_at >= since).count() as u64)
    }
}

/// In-memory product repository
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a repository pre-loaded with `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// Add or replace a product (for testing purposes).
    pub async fn put(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn query(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> = products.values().filter(|p| query.matches(p)).collect();

        match query.sort {
            ProductSort::Name => {
                matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            }
            // `None` sorts after every `Some`, matching `NULLS LAST`.
            ProductSort::Hardiness => matching.sort_by(|a, b| {
                match (a.min_temperature, b.min_temperature) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then(a.id.cmp(&b.id))
            }),
        }

        let total = matching.len() as u64;
        let offset = query.window.offset() as usize;
        let limit = query.window.limit().map_or(usize::MAX, |l| l as usize);
        let products = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(ProductPage { products, total })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}
