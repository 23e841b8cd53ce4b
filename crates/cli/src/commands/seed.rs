//! Seed the product catalog from a YAML file.
//!
//! Products already present (matched by name) are left untouched, so the
//! command can be re-run safely.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use verdant_core::{CurrencyCode, SizeCategory};
use verdant_storefront::config::DataStoreConfig;
use verdant_storefront::db;

use super::CommandError;

/// Top-level layout of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<CatalogEntry>,
}

/// One product as written in a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    /// Unit price in minor currency units.
    pub price_amount: i64,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub min_temperature: Option<i32>,
    pub size_category: SizeCategory,
    pub max_height_cm: Option<i32>,
    pub image_url: Option<String>,
}

/// Summary of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: u64,
    pub skipped: u64,
}

/// Check a parsed catalog, returning one message per problem.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for (index, entry) in catalog.products.iter().enumerate() {
        let label = if entry.name.trim().is_empty() {
            errors.push(format!("products[{index}]: name is empty"));
            format!("products[{index}]")
        } else {
            entry.name.clone()
        };

        if !names.insert(entry.name.trim().to_lowercase()) {
            errors.push(format!("{label}: duplicate name"));
        }
        if entry.category.trim().is_empty() {
            errors.push(format!("{label}: category is empty"));
        }
        if entry.price_amount < 0 {
            errors.push(format!("{label}: price_amount is negative"));
        }
        if entry.max_height_cm.is_some_and(|h| h <= 0) {
            errors.push(format!("{label}: max_height_cm must be positive"));
        }
    }

    errors
}

/// Seed products from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML catalog
/// * `clear_existing` - If true, delete every product first
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot be
/// read or validated, or database operations fail.
pub async fn catalog(file_path: &str, clear_existing: bool) -> Result<SeedResult, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    info!(products = catalog.products.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::Validation(errors.len()));
    }

    let config = DataStoreConfig::from_env()?;
    let pool = db::create_pool(&config).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;

    if clear_existing {
        let removed = sqlx::query("DELETE FROM storefront.product")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        info!(removed, "Cleared existing products");
    }

    let mut result = SeedResult::default();
    for entry in &catalog.products {
        let affected = sqlx::query(
            r"
            INSERT INTO storefront.product (
                name, description, category, price_amount, currency,
                min_temperature, size_category, max_height_cm, image_url
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (SELECT 1 FROM storefront.product WHERE name = $1)
            ",
        )
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(&entry.category)
        .bind(entry.price_amount)
        .bind(entry.currency.code())
        .bind(entry.min_temperature)
        .bind(entry.size_category.as_str())
        .bind(entry.max_height_cm)
        .bind(&entry.image_url)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            result.skipped += 1;
        } else {
            result.inserted += affected;
        }
    }

    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", result.inserted);
    info!("  Products skipped (already exist): {}", result.skipped);

    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog: CatalogFile =
            serde_yaml::from_str(include_str!("../../seeds/catalog.yaml")).unwrap();
        assert!(!catalog.products.is_empty());
        assert!(validate_catalog(&catalog).is_empty());

        let aloe = catalog
            .products
            .iter()
            .find(|p| p.name == "Aloe Striata")
            .unwrap();
        assert_eq!(aloe.currency, CurrencyCode::EUR);
        assert_eq!(aloe.min_temperature, None);
    }

    #[test]
    fn test_validate_catalog_reports_each_problem() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
products:
  - name: Opuntia
    category: cactus
    price_amount: -1
    size_category: petit
  - name: opuntia
    category: ''
    price_amount: 100
    size_category: moyen
    max_height_cm: 0
",
        )
        .unwrap();

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("negative")));
        assert!(errors.iter().any(|e| e.contains("duplicate")));
        assert!(errors.iter().any(|e| e.contains("category")));
        assert!(errors.iter().any(|e| e.contains("max_height_cm")));
    }

    #[test]
    fn test_unknown_size_category_is_rejected() {
        let parsed = serde_yaml::from_str::<CatalogFile>(
            r"
products:
  - name: Mystery
    category: cactus
    price_amount: 100
    size_category: huge
",
        );
        assert!(parsed.is_err());
    }
}
