//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use verdant_core::types::money::to_major_units;
use verdant_core::{ColdResistance, CurrencyCode, ProductId, SizeCategory};

/// A catalog entry. Read-only for the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Free-form tag such as `cactus` or `succulent`.
    pub category: String,
    /// Unit price in minor currency units.
    pub price_amount: i64,
    pub currency: CurrencyCode,
    /// Lowest tolerated temperature in °C.
    pub min_temperature: Option<i32>,
    pub size_category: SizeCategory,
    pub max_height_cm: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product decorated with derived labels for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    #[serde(flatten)]
    pub product: Product,
    /// Price at presentation precision.
    pub price: Decimal,
    pub cold_resistance: ColdResistance,
    pub cold_resistance_description: &'static str,
    /// Present in filtered listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_description: Option<String>,
}

impl CatalogProduct {
    /// Decorate a product. `with_size` adds the size description.
    #[must_use]
    pub fn decorate(product: Product, with_size: bool) -> Self {
        let cold_resistance = ColdResistance::classify(product.min_temperature);
        let size_description =
            with_size.then(|| product.size_category.describe(product.max_height_cm));

        Self {
            price: to_major_units(product.price_amount),
            cold_resistance,
            cold_resistance_description: cold_resistance.label(),
            size_description,
            product,
        }
    }
}

/// Ordering of a product listing.
///
/// Both orders are total: ties are broken by product ID so that consecutive
/// pages never overlap or skip rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
    /// Name ascending.
    #[default]
    Name,
    /// Minimum temperature ascending, unspecified last.
    Hardiness,
}

/// Which slice of the sorted result to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PageWindow {
    /// Every matching product.
    #[default]
    All,
    /// The first `limit` products.
    First { limit: u32 },
    /// Products `offset ..= offset + limit - 1`.
    Range { offset: u32, limit: u32 },
}

impl PageWindow {
    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        match self {
            Self::All | Self::First { .. } => 0,
            Self::Range { offset, .. } => *offset,
        }
    }

    /// Maximum rows to return, `None` for no cap.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::First { limit } | Self::Range { limit, .. } => Some(*limit),
        }
    }
}

/// A validated product query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Exact category match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Inclusive lower bound on `min_temperature`. Unspecified temperatures
    /// never satisfy a bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_category: Option<SizeCategory>,
    pub sort: ProductSort,
    pub window: PageWindow,
}

impl ProductQuery {
    /// Whether any catalog filter (as opposed to paging or sorting) is set.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.category.is_some() || self.min_temperature.is_some() || self.size_category.is_some()
    }

    /// Whether a product satisfies the filters. Ignores sorting and paging.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| &product.category == category)
            && self
                .min_temperature
                .is_none_or(|bound| product.min_temperature.is_some_and(|t| t >= bound))
            && self
                .size_category
                .is_none_or(|size| product.size_category == size)
    }
}

/// One page of a product query.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the filters, ignoring pagination.
    pub total: u64,
}
