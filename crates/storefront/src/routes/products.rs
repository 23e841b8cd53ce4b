//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};

use verdant_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::CatalogProduct;
use crate::services::{CatalogPage, ProductQueryParams};
use crate::state::AppState;

/// `GET /products` - filtered, sorted, paginated listing.
///
/// A query string that does not even decode (e.g. a repeated key) is treated
/// like an empty one.
pub async fn index(
    State(state): State<AppState>,
    params: std::result::Result<Query<ProductQueryParams>, QueryRejection>,
) -> Result<Json<CatalogPage>> {
    let params = params.map(|Query(p)| p).unwrap_or_else(|rejection| {
        tracing::debug!(error = %rejection, "Ignoring undecodable product query");
        ProductQueryParams::default()
    });

    let page = state.catalog().query(params.into_query()).await?;
    Ok(Json(page))
}

/// `GET /products/{id}` - one decorated product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>> {
    let not_found = || AppError::NotFound(format!("product {id}"));
    let product_id = id.parse::<i32>().map(ProductId::new).map_err(|_| not_found())?;

    state
        .catalog()
        .get(product_id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
