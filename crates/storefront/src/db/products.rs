//! Product repository (read-only catalog access).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use verdant_core::{CurrencyCode, ProductId, SizeCategory};

use super::RepositoryError;
use crate::models::{Product, ProductPage, ProductQuery, ProductSort};

/// Read access to the catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Run a filtered, sorted, paginated query.
    async fn query(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError>;

    /// Get a product by ID.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    category: String,
    price_amount: i64,
    currency: String,
    min_temperature: Option<i32>,
    size_category: SizeCategory,
    max_height_cm: Option<i32>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price_amount: row.price_amount,
            currency,
            min_temperature: row.min_temperature,
            size_category: row.size_category,
            max_height_cm: row.max_height_cm,
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, category, price_amount, currency, \
     min_temperature, size_category, max_height_cm, image_url, created_at";

/// Append the `WHERE` clause for the query's filters.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");
    if let Some(category) = &query.category {
        builder.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(bound) = query.min_temperature {
        builder.push(" AND min_temperature >= ").push_bind(bound);
    }
    if let Some(size) = query.size_category {
        builder
            .push(" AND size_category = ")
            .push_bind(size.as_str());
    }
}

/// `PostgreSQL`-backed product repository.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn query(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.product");
        push_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product"
        ));
        push_filters(&mut select, query);
        select.push(match query.sort {
            ProductSort::Name => " ORDER BY name ASC, id ASC",
            ProductSort::Hardiness => " ORDER BY min_temperature ASC NULLS LAST, id ASC",
        });
        if let Some(limit) = query.window.limit() {
            select.push(" LIMIT ").push_bind(i64::from(limit));
        }
        if query.window.offset() > 0 {
            select
                .push(" OFFSET ")
                .push_bind(i64::from(query.window.offset()));
        }

        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage {
            products,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }
}
