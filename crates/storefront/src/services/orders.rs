//! Order intake and ownership-scoped reads.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use verdant_core::{CurrencyCode, Email, Money, OrderId, OrderStatus, PaymentStatus, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{LineItem, NewOrder, Order, OwnershipPredicate, RecordedOrder};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The confirmation is missing a required field or has a malformed one.
    #[error("{0}")]
    Validation(String),

    /// The order store failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A payment confirmation as delivered by the checkout flow.
///
/// Already verified as authentic by the time it arrives here; required fields
/// are still optional at this layer so their absence is reported as a
/// validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    #[serde(alias = "sessionId")]
    pub payment_session_id: Option<String>,
    #[serde(alias = "email")]
    pub customer_email: Option<String>,
    #[serde(alias = "amount", alias = "total")]
    pub total_amount: Option<i64>,
    pub currency: Option<String>,
    pub items: Option<Vec<LineItem>>,
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl OrderConfirmation {
    /// Validate into an insertable order with `paid`/`confirmed` statuses.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` naming the first offending field.
    pub fn validate(self) -> Result<NewOrder, OrderError> {
        let payment_session_id = non_blank(self.payment_session_id)
            .ok_or_else(|| OrderError::Validation("paymentSessionId is required".to_string()))?;

        let raw_email = self
            .customer_email
            .ok_or_else(|| OrderError::Validation("customerEmail is required".to_string()))?;
        let customer_email = Email::parse(&raw_email)
            .map_err(|e| OrderError::Validation(format!("customerEmail: {e}")))?;

        let total_amount = self
            .total_amount
            .ok_or_else(|| OrderError::Validation("totalAmount is required".to_string()))?;
        if total_amount < 0 {
            return Err(OrderError::Validation(
                "totalAmount must not be negative".to_string(),
            ));
        }

        let currency = match non_blank(self.currency) {
            Some(code) => code
                .parse::<CurrencyCode>()
                .map_err(|e| OrderError::Validation(format!("currency: {e}")))?,
            None => CurrencyCode::default(),
        };

        let items = self.items.unwrap_or_default();
        if items.is_empty() {
            return Err(OrderError::Validation(
                "items must contain at least one line".to_string(),
            ));
        }
        for (index, item) in items.iter().enumerate() {
            validate_item(index, item)?;
        }

        if let Some(metadata) = &self.metadata
            && !metadata.is_object()
        {
            return Err(OrderError::Validation(
                "metadata must be a JSON object".to_string(),
            ));
        }

        Ok(NewOrder {
            payment_session_id,
            user_id: self.user_id,
            customer_email,
            customer_name: non_blank(self.customer_name),
            customer_phone: non_blank(self.customer_phone),
            customer_address: non_blank(self.customer_address),
            total_amount,
            currency,
            items,
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Confirmed,
            metadata: self.metadata,
        })
    }
}

fn validate_item(index: usize, item: &LineItem) -> Result<(), OrderError> {
    if item.name.trim().is_empty() {
        return Err(OrderError::Validation(format!(
            "items[{index}].name is required"
        )));
    }
    if item.quantity == 0 {
        return Err(OrderError::Validation(format!(
            "items[{index}].quantity must be at least 1"
        )));
    }
    if item.unit_price < 0 {
        return Err(OrderError::Validation(format!(
            "items[{index}].unitPrice must not be negative"
        )));
    }
    if item.subtotal().is_none() {
        return Err(OrderError::Validation(format!(
            "items[{index}] subtotal overflows"
        )));
    }
    Ok(())
}

/// Idempotent order persistence keyed by payment session.
#[derive(Clone)]
pub struct OrderStore {
    orders: Arc<dyn OrderRepository>,
}

impl OrderStore {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Record a payment confirmation exactly once.
    ///
    /// A confirmation whose payment session is already recorded returns the
    /// existing order with `created = false` and changes nothing. The unique
    /// key on `payment_session_id` decides races between concurrent
    /// deliveries; the lookup beforehand only skips the insert attempt.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` before touching the store, or
    /// `OrderError::Repository` on store failure.
    #[instrument(
        skip_all,
        fields(
            session_id = tracing::field::Empty,
            order_id = tracing::field::Empty,
            created = tracing::field::Empty
        )
    )]
    pub async fn record_order(
        &self,
        confirmation: OrderConfirmation,
    ) -> Result<RecordedOrder, OrderError> {
        let new_order = confirmation.validate()?;
        let span = tracing::Span::current();
        span.record("session_id", new_order.payment_session_id.as_str());

        if let Some(existing) = self
            .orders
            .find_by_payment_session(&new_order.payment_session_id)
            .await?
        {
            span.record("order_id", existing.id.as_i32());
            span.record("created", false);
            tracing::info!("Payment session already recorded");
            return Ok(RecordedOrder {
                order_id: existing.id,
                created: false,
            });
        }

        match self.orders.insert(&new_order).await {
            Ok(order) => {
                span.record("order_id", order.id.as_i32());
                span.record("created", true);
                tracing::info!(
                    total = %Money::from_minor(order.total_amount, order.currency),
                    items = order.items.len(),
                    "Order recorded"
                );
                Ok(RecordedOrder {
                    order_id: order.id,
                    created: true,
                })
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!("Concurrent confirmation won the insert race");
                let existing = self
                    .orders
                    .find_by_payment_session(&new_order.payment_session_id)
                    .await?
                    .ok_or_else(|| {
                        RepositoryError::Conflict(
                            "payment session conflicts but no order is visible".to_string(),
                        )
                    })?;
                span.record("order_id", existing.id.as_i32());
                span.record("created", false);
                Ok(RecordedOrder {
                    order_id: existing.id,
                    created: false,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Every order the predicate matches, newest first, each exactly once.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on store failure.
    #[instrument(skip_all, fields(by_user = predicate.user_id.is_some()))]
    pub async fn fetch_orders_by_ownership(
        &self,
        predicate: &OwnershipPredicate,
    ) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.orders.list_by_ownership(predicate).await?;
        let mut seen = HashSet::new();
        orders.retain(|order| seen.insert(order.id));
        Ok(orders)
    }

    /// One order, if it exists and the predicate matches it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on store failure.
    pub async fn fetch_order(
        &self,
        id: OrderId,
        predicate: &OwnershipPredicate,
    ) -> Result<Option<Order>, OrderError> {
        let order = self.orders.get(id).await?;
        Ok(order.filter(|o| predicate.matches(o)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::*;
    use crate::db::{InMemoryOrderRepository, OrderSnapshot, OrderTotals};

    /// Wraps the in-memory store to replay interleavings a single-threaded
    /// runtime never produces on its own.
    #[derive(Default)]
    struct InterleavedRepository {
        inner: InMemoryOrderRepository,
        /// Lookups that report no order even when one is stored, as a
        /// delivery that read before a concurrent insert committed would.
        stale_lookups: AtomicUsize,
        /// Return every listed order twice.
        duplicate_listing: bool,
    }

    #[async_trait]
    impl OrderRepository for InterleavedRepository {
        async fn find_by_payment_session(
            &self,
            payment_session_id: &str,
        ) -> Result<Option<Order>, RepositoryError> {
            let stale = self
                .stale_lookups
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale {
                return Ok(None);
            }
            self.inner.find_by_payment_session(payment_session_id).await
        }

        async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
            self.inner.insert(order).await
        }

        async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
            self.inner.get(id).await
        }

        async fn list_by_ownership(
            &self,
            predicate: &OwnershipPredicate,
        ) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.inner.list_by_ownership(predicate).await?;
            if self.duplicate_listing {
                Ok(orders.iter().flat_map(|o| [o.clone(), o.clone()]).collect())
            } else {
                Ok(orders)
            }
        }

        async fn totals(
            &self,
            since: Option<DateTime<Utc>>,
        ) -> Result<OrderTotals, RepositoryError> {
            self.inner.totals(since).await
        }

        async fn order_status_counts(
            &self,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<(String, u64)>, RepositoryError> {
            self.inner.order_status_counts(since).await
        }

        async fn payment_status_counts(
            &self,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<(String, u64)>, RepositoryError> {
            self.inner.payment_status_counts(since).await
        }

        async fn snapshots(
            &self,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
            self.inner.snapshots(since).await
        }

        async fn count_created_since(
            &self,
            since: DateTime<Utc>,
        ) -> Result<u64, RepositoryError> {
            self.inner.count_created_since(since).await
        }
    }

    fn confirmation(session: &str, email: &str, total: i64) -> OrderConfirmation {
        OrderConfirmation {
            payment_session_id: Some(session.to_string()),
            customer_email: Some(email.to_string()),
            total_amount: Some(total),
            items: Some(vec![LineItem {
                name: "Euphorbia Ingens XXL".to_string(),
                quantity: 1,
                unit_price: total,
            }]),
            ..OrderConfirmation::default()
        }
    }

    fn store() -> (OrderStore, Arc<InMemoryOrderRepository>) {
        let repo = Arc::new(InMemoryOrderRepository::new());
        (OrderStore::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_record_order_is_idempotent() {
        let (store, repo) = store();
        let first = store
            .record_order(confirmation("cs_1", "a@x.com", 34_900))
            .await
            .unwrap();
        assert!(first.created);

        // Differing incidental fields do not create a second order.
        let second = store
            .record_order(confirmation("cs_1", "other@x.com", 1))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.order_id, first.order_id);
        assert_eq!(repo.len().await, 1);

        let totals = repo.totals(None).await.unwrap();
        assert_eq!(totals.paid_revenue, 34_900);
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_create_one_order() {
        let (store, repo) = store();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .record_order(confirmation("cs_race", "a@x.com", 500))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut ids = HashSet::new();
        for handle in handles {
            let recorded = handle.await.unwrap().unwrap();
            created += usize::from(recorded.created);
            ids.insert(recorded.order_id);
        }
        assert_eq!(created, 1);
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_conflict_returns_the_winning_order() {
        let repo = Arc::new(InterleavedRepository::default());
        let store = OrderStore::new(repo.clone());
        let winner = store
            .record_order(confirmation("cs_race", "a@x.com", 500))
            .await
            .unwrap();
        assert!(winner.created);

        // The next delivery misses the committed order on lookup, so only the
        // unique key stops its insert.
        repo.stale_lookups.store(1, Ordering::SeqCst);
        let loser = store
            .record_order(confirmation("cs_race", "a@x.com", 500))
            .await
            .unwrap();

        assert!(!loser.created);
        assert_eq!(loser.order_id, winner.order_id);
        assert_eq!(repo.stale_lookups.load(Ordering::SeqCst), 0);
        assert_eq!(repo.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_ownership_listing_returns_each_order_once() {
        let repo = Arc::new(InterleavedRepository {
            duplicate_listing: true,
            ..InterleavedRepository::default()
        });
        let store = OrderStore::new(repo.clone());
        let user_id = UserId::new(uuid::Uuid::new_v4());

        let mut both = confirmation("cs_both", "a@x.com", 100);
        both.user_id = Some(user_id);
        let first = store.record_order(both).await.unwrap();
        let second = store
            .record_order(confirmation("cs_guest", "a@x.com", 200))
            .await
            .unwrap();

        let predicate = OwnershipPredicate {
            user_id: Some(user_id),
            email: Email::parse("a@x.com").unwrap(),
        };
        let orders = store.fetch_orders_by_ownership(&predicate).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.order_id));
        assert!(ids.contains(&second.order_id));
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_write() {
        let (store, repo) = store();
        let mut missing_items = confirmation("cs_1", "a@x.com", 100);
        missing_items.items = Some(Vec::new());
        let err = store.record_order(missing_items).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let mut blank_session = confirmation("  ", "a@x.com", 100);
        blank_session.payment_session_id = Some("  ".to_string());
        assert!(store.record_order(blank_session).await.is_err());

        let bad_email = confirmation("cs_2", "not-an-email", 100);
        assert!(store.record_order(bad_email).await.is_err());

        assert!(repo.is_empty().await);
    }

    #[test]
    fn test_validate_sets_statuses_and_defaults() {
        let order = confirmation("cs_1", "A@X.com", 100).validate().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(order.currency, CurrencyCode::EUR);
        assert_eq!(order.customer_email.as_str(), "a@x.com");
    }

    #[test]
    fn test_validate_rejects_bad_lines_and_metadata() {
        let mut zero_qty = confirmation("cs_1", "a@x.com", 100);
        zero_qty.items = Some(vec![LineItem {
            name: "Opuntia".to_string(),
            quantity: 0,
            unit_price: 100,
        }]);
        assert!(zero_qty.validate().is_err());

        let mut array_metadata = confirmation("cs_1", "a@x.com", 100);
        array_metadata.metadata = Some(json!([1, 2]));
        assert!(array_metadata.validate().is_err());

        let mut unknown_currency = confirmation("cs_1", "a@x.com", 100);
        unknown_currency.currency = Some("XYZ".to_string());
        assert!(unknown_currency.validate().is_err());
    }

    #[test]
    fn test_confirmation_accepts_processor_field_names() {
        let confirmation: OrderConfirmation = serde_json::from_value(json!({
            "sessionId": "cs_1",
            "email": "a@x.com",
            "amount": 34900,
            "currency": "eur",
            "items": [{"name": "Euphorbia Ingens XXL", "qty": 1, "price": 34900}]
        }))
        .unwrap();
        let order = confirmation.validate().unwrap();
        assert_eq!(order.payment_session_id, "cs_1");
        assert_eq!(order.total_amount, 34_900);
    }

    #[tokio::test]
    async fn test_fetch_order_hides_other_owners() {
        let (store, _) = store();
        let recorded = store
            .record_order(confirmation("cs_1", "a@x.com", 100))
            .await
            .unwrap();

        let mine = OwnershipPredicate {
            user_id: None,
            email: Email::parse("a@x.com").unwrap(),
        };
        let theirs = OwnershipPredicate {
            user_id: None,
            email: Email::parse("b@x.com").unwrap(),
        };
        assert!(store.fetch_order(recorded.order_id, &mine).await.unwrap().is_some());
        assert!(store.fetch_order(recorded.order_id, &theirs).await.unwrap().is_none());
    }
}
