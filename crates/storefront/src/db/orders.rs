//! Order repository.
//!
//! The `PostgreSQL` implementation uses runtime-checked queries so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use verdant_core::{CurrencyCode, Email, OrderId, OrderStatus, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::{LineItem, NewOrder, Order, OwnershipPredicate};

/// Order count and paid revenue over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_orders: u64,
    /// Sum of `total_amount` over paid orders, in minor units.
    pub paid_revenue: i64,
}

/// The columns daily rollups need from each order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub created_at: DateTime<Utc>,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
}

/// Storage for confirmed orders.
///
/// `since` bounds are inclusive on `created_at`; `None` means all time.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Look up the order recorded for a payment session.
    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Insert a new order.
    ///
    /// Returns `RepositoryError::Conflict` if the payment session already has
    /// an order.
    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Get an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All orders matching the predicate, newest first.
    async fn list_by_ownership(
        &self,
        predicate: &OwnershipPredicate,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Count and paid revenue.
    async fn totals(&self, since: Option<DateTime<Utc>>) -> Result<OrderTotals, RepositoryError>;

    /// Counts grouped by literal `order_status`.
    async fn order_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError>;

    /// Counts grouped by literal `payment_status`.
    async fn payment_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError>;

    /// Rollup columns of every order in the window, oldest first.
    async fn snapshots(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError>;

    /// Number of orders created at or after `since`.
    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Database row for `storefront.order`.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    payment_session_id: String,
    user_id: Option<UserId>,
    customer_email: Email,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    total_amount: i64,
    currency: String,
    items: Json<Vec<LineItem>>,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    metadata: Option<Json<serde_json::Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            payment_session_id: row.payment_session_id,
            user_id: row.user_id,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_address: row.customer_address,
            total_amount: row.total_amount,
            currency,
            items: row.items.0,
            payment_status: row.payment_status,
            order_status: row.order_status,
            metadata: row.metadata.map(|m| m.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LabelCountRow {
    label: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    created_at: DateTime<Utc>,
    total_amount: i64,
    payment_status: PaymentStatus,
}

const ORDER_COLUMNS: &str = "id, payment_session_id, user_id, customer_email, customer_name, \
     customer_phone, customer_address, total_amount, currency, items, payment_status, \
     order_status, metadata, created_at, updated_at";

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// `PostgreSQL`-backed order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn label_counts(
        &self,
        column: &'static str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError> {
        let sql = format!(
            "SELECT {column} AS label, COUNT(*) AS count \
             FROM storefront.order \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
             GROUP BY {column} \
             ORDER BY {column}"
        );
        let rows = sqlx::query_as::<_, LabelCountRow>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.label, to_count(r.count)))
            .collect())
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE payment_session_id = $1"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(payment_session_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.order (
                payment_session_id, user_id, customer_email, customer_name,
                customer_phone, customer_address, total_amount, currency, items,
                payment_status, order_status, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&order.payment_session_id)
            .bind(order.user_id)
            .bind(&order.customer_email)
            .bind(&order.customer_name)
            .bind(&order.customer_phone)
            .bind(&order.customer_address)
            .bind(order.total_amount)
            .bind(order.currency.code())
            .bind(Json(&order.items))
            .bind(&order.payment_status)
            .bind(&order.order_status)
            .bind(order.metadata.as_ref().map(Json))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "order for payment session"))?;

        Order::try_from(row)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_by_ownership(
        &self,
        predicate: &OwnershipPredicate,
    ) -> Result<Vec<Order>, RepositoryError> {
        // A NULL $1 makes the user_id arm false, leaving only the email arm.
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order \
             WHERE user_id = $1 OR customer_email = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(predicate.user_id)
            .bind(&predicate.email)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn totals(&self, since: Option<DateTime<Utc>>) -> Result<OrderTotals, RepositoryError> {
        let (total_orders, paid_revenue): (i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT
            FROM storefront.order
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderTotals {
            total_orders: to_count(total_orders),
            paid_revenue,
        })
    }

    async fn order_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError> {
        self.label_counts("order_status", since).await
    }

    async fn payment_status_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(String, u64)>, RepositoryError> {
        self.label_counts("payment_status", since).await
    }

    async fn snapshots(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r"
            SELECT created_at, total_amount, payment_status
            FROM storefront.order
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderSnapshot {
                created_at: r.created_at,
                total_amount: r.total_amount,
                payment_status: r.payment_status,
            })
            .collect())
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM storefront.order WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;

        Ok(to_count(count))
    }
}
