//! Product browsing: query-string parsing, filtering and decoration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use verdant_core::{ProductId, SizeCategory};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{CatalogProduct, PageWindow, ProductQuery, ProductSort};

/// Window size when only an offset is given.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest accepted `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw listing parameters, exactly as they appear in the query string.
///
/// Every field is kept as text so that a malformed value can be dropped
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQueryParams {
    pub category: Option<String>,
    pub min_temperature: Option<String>,
    pub size_category: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
}

impl ProductQueryParams {
    /// Build a query, ignoring anything that does not parse.
    #[must_use]
    pub fn into_query(self) -> ProductQuery {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
        let min_temperature = self.min_temperature.as_deref().and_then(parse_temperature);
        let size_category = self
            .size_category
            .as_deref()
            .and_then(|s| s.trim().to_ascii_lowercase().parse::<SizeCategory>().ok());

        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|&l| l >= 1)
            .map(|l| l.min(MAX_PAGE_SIZE));
        let offset = self
            .offset
            .as_deref()
            .and_then(|o| o.trim().parse::<u32>().ok());
        let window = match (offset, limit) {
            (Some(offset), limit) => PageWindow::Range {
                offset,
                limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
            },
            (None, Some(limit)) => PageWindow::First { limit },
            (None, None) => PageWindow::All,
        };

        let sort = match self.sort.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("name") => ProductSort::Name,
            Some(s) if s.eq_ignore_ascii_case("hardiness") => ProductSort::Hardiness,
            _ if min_temperature.is_some() => ProductSort::Hardiness,
            _ => ProductSort::Name,
        };

        ProductQuery {
            category,
            min_temperature,
            size_category,
            sort,
            window,
        }
    }
}

/// Parse a temperature bound. A fractional bound rounds up, which keeps the
/// inclusive comparison exact over integer product temperatures.
fn parse_temperature(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(whole) = raw.parse::<i32>() {
        return Some(whole);
    }
    let value = raw.parse::<f64>().ok().filter(|v| v.is_finite())?.ceil();
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)] // range checked above, value is integral
    Some(value as i32)
}

/// One page of decorated products, with the filters that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<CatalogProduct>,
    pub total: u64,
    pub filters: ProductQuery,
}

/// Filtered, sorted, paginated product listings.
#[derive(Clone)]
pub struct ProductFilterEngine {
    products: Arc<dyn ProductRepository>,
}

impl ProductFilterEngine {
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Run a query and decorate the results.
    ///
    /// Filtered listings also carry a size description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog read fails.
    #[instrument(skip(self))]
    pub async fn query(&self, query: ProductQuery) -> Result<CatalogPage, RepositoryError> {
        let page = self.products.query(&query).await?;
        let with_size = query.is_filtered();
        let products = page
            .products
            .into_iter()
            .map(|p| CatalogProduct::decorate(p, with_size))
            .collect();

        Ok(CatalogPage {
            products,
            total: page.total,
            filters: query,
        })
    }

    /// One decorated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog read fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let product = self.products.get(id).await?;
        Ok(product.map(|p| CatalogProduct::decorate(p, true)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use verdant_core::{ColdResistance, CurrencyCode};

    use super::*;
    use crate::db::InMemoryProductRepository;
    use crate::models::Product;

    fn params(pairs: &[(&str, &str)]) -> ProductQueryParams {
        let mut p = ProductQueryParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "category" => p.category = value,
                "minTemperature" => p.min_temperature = value,
                "sizeCategory" => p.size_category = value,
                "limit" => p.limit = value,
                "offset" => p.offset = value,
                "sort" => p.sort = value,
                _ => {}
            }
        }
        p
    }

    fn product(id: i32, name: &str, category: &str, min_temperature: Option<i32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            price_amount: 2_500,
            currency: CurrencyCode::EUR,
            min_temperature,
            size_category: SizeCategory::Grand,
            max_height_cm: Some(180),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn engine() -> ProductFilterEngine {
        ProductFilterEngine::new(Arc::new(InMemoryProductRepository::with_products([
            product(1, "Opuntia humifusa", "cactus", Some(-25)),
            product(2, "Echinopsis", "cactus", Some(-5)),
            product(3, "Cereus", "cactus", Some(-10)),
            product(4, "Aloe vera", "succulent", Some(5)),
            product(5, "Mammillaria", "cactus", None),
            product(6, "Agave parryi", "agave", Some(-15)),
        ])))
    }

    #[test]
    fn test_malformed_values_are_ignored() {
        let query = params(&[
            ("minTemperature", "cold"),
            ("limit", "ten"),
            ("offset", "-3"),
            ("sizeCategory", "huge"),
        ])
        .into_query();
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_category_all_means_no_filter() {
        let query = params(&[("category", "All")]).into_query();
        assert!(query.category.is_none());
        assert!(!query.is_filtered());
    }

    #[test]
    fn test_pagination_policy() {
        let offset_only = params(&[("offset", "40")]).into_query();
        assert_eq!(
            offset_only.window,
            PageWindow::Range {
                offset: 40,
                limit: DEFAULT_PAGE_SIZE
            }
        );

        let limit_only = params(&[("limit", "5")]).into_query();
        assert_eq!(limit_only.window, PageWindow::First { limit: 5 });

        let zero_limit = params(&[("limit", "0")]).into_query();
        assert_eq!(zero_limit.window, PageWindow::All);

        let huge = params(&[("limit", "100000")]).into_query();
        assert_eq!(huge.window, PageWindow::First { limit: MAX_PAGE_SIZE });
    }

    #[test]
    fn test_temperature_bound_defaults_to_hardiness_sort() {
        let query = params(&[("minTemperature", "-10")]).into_query();
        assert_eq!(query.min_temperature, Some(-10));
        assert_eq!(query.sort, ProductSort::Hardiness);

        let explicit = params(&[("minTemperature", "-10"), ("sort", "name")]).into_query();
        assert_eq!(explicit.sort, ProductSort::Name);
    }

    #[test]
    fn test_fractional_temperature_rounds_up() {
        assert_eq!(parse_temperature("-10.5"), Some(-10));
        assert_eq!(parse_temperature(" 3 "), Some(3));
        assert_eq!(parse_temperature("NaN"), None);
        assert_eq!(parse_temperature("1e20"), None);
    }

    #[tokio::test]
    async fn test_cactus_at_minus_ten() {
        let page = engine()
            .query(params(&[("category", "cactus"), ("minTemperature", "-10")]).into_query())
            .await
            .unwrap();

        let names: Vec<_> = page.products.iter().map(|p| p.product.name.as_str()).collect();
        assert_eq!(names, ["Cereus", "Echinopsis"]);
        assert_eq!(page.total, 2);
        for p in &page.products {
            assert_eq!(p.product.category, "cactus");
            assert!(p.product.min_temperature.unwrap() >= -10);
            assert!(!p.cold_resistance_description.is_empty());
            assert_eq!(p.size_description.as_deref(), Some("Large (up to 180 cm)"));
        }
        assert_eq!(page.products[0].cold_resistance, ColdResistance::ModerateCold);
    }

    #[tokio::test]
    async fn test_general_listing_has_no_size_description() {
        let page = engine().query(ProductQuery::default()).await.unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.products[0].product.name, "Agave parryi");
        assert!(page.products.iter().all(|p| p.size_description.is_none()));
    }

    #[tokio::test]
    async fn test_consecutive_pages_partition_the_listing() {
        let engine = engine();
        let window = |offset, limit| ProductQuery {
            window: PageWindow::Range { offset, limit },
            ..ProductQuery::default()
        };
        let ids = |page: CatalogPage| -> Vec<i32> {
            page.products.iter().map(|p| p.product.id.as_i32()).collect()
        };

        let first = ids(engine.query(window(0, 3)).await.unwrap());
        let second = ids(engine.query(window(3, 3)).await.unwrap());
        let both = ids(engine.query(window(0, 6)).await.unwrap());

        assert!(first.iter().all(|id| !second.contains(id)));
        assert_eq!([first, second].concat(), both);
    }
}
