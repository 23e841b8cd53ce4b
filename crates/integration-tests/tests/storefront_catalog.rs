//! Catalog browsing through the full router.
//!
//! Run with: cargo test -p verdant-integration-tests

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;

use verdant_core::{CurrencyCode, ProductId, SizeCategory};
use verdant_integration_tests::{RequestBuilder, TestApp};
use verdant_storefront::models::Product;

fn product(
    id: i32,
    name: &str,
    category: &str,
    min_temperature: Option<i32>,
    size_category: SizeCategory,
    max_height_cm: Option<i32>,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        price_amount: 4_500,
        currency: CurrencyCode::EUR,
        min_temperature,
        size_category,
        max_height_cm,
        image_url: None,
        created_at: Utc::now(),
    }
}

async fn seeded_app() -> TestApp {
    let app = TestApp::new();
    for p in [
        product(1, "Opuntia Humifusa", "cactus", Some(-25), SizeCategory::Petit, Some(30)),
        product(2, "Echinopsis Spachiana", "cactus", Some(-8), SizeCategory::Grand, Some(180)),
        product(3, "Cereus Peruvianus", "cactus", Some(-10), SizeCategory::Grand, Some(180)),
        product(4, "Echinocactus Grusonii", "cactus", Some(5), SizeCategory::Moyen, None),
        product(5, "Aloe Striata", "succulent", None, SizeCategory::Petit, None),
        product(6, "Agave Parryi", "succulent", Some(-15), SizeCategory::Moyen, Some(50)),
        product(7, "Mammillaria", "cactus", None, SizeCategory::Petit, None),
    ] {
        app.products.put(p).await;
    }
    app
}

fn names(body: &Value) -> Vec<String> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_cold_hardy_cactus_listing() {
    let app = seeded_app().await;
    let response = app
        .send(RequestBuilder::get("/products?category=cactus&minTemperature=-10").build())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        names(&response.body),
        ["Cereus Peruvianus", "Echinopsis Spachiana", "Echinocactus Grusonii"]
    );
    assert_eq!(response.body["total"], 3);

    let first = &response.body["products"][0];
    assert_eq!(first["coldResistance"], "moderate_cold");
    assert_eq!(first["sizeDescription"], "Large (up to 180 cm)");
    assert_eq!(first["price"], "45.00");
    assert!(first["coldResistanceDescription"].is_string());
}

#[tokio::test]
async fn test_unfiltered_listing_is_sorted_by_name_without_size_description() {
    let app = seeded_app().await;
    let response = app.send(RequestBuilder::get("/products").build()).await;

    assert_eq!(response.status, StatusCode::OK);
    let listed = names(&response.body);
    let mut sorted = listed.clone();
    sorted.sort();
    assert_eq!(listed, sorted);
    assert_eq!(listed.len(), 7);
    assert!(
        response.body["products"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p.get("sizeDescription").is_none())
    );
}

#[tokio::test]
async fn test_malformed_filters_are_ignored() {
    let app = seeded_app().await;
    let response = app
        .send(
            RequestBuilder::get("/products?minTemperature=freezing&limit=lots&sizeCategory=huge")
                .build(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 7);
}

#[tokio::test]
async fn test_unspecified_hardiness_sorts_last() {
    let app = seeded_app().await;
    let response = app
        .send(RequestBuilder::get("/products?sort=hardiness").build())
        .await;

    let listed = names(&response.body);
    assert_eq!(listed.first().map(String::as_str), Some("Opuntia Humifusa"));
    let tail: Vec<&str> = listed.iter().rev().take(2).map(String::as_str).collect();
    assert!(tail.contains(&"Aloe Striata"));
    assert!(tail.contains(&"Mammillaria"));
}

#[tokio::test]
async fn test_pages_do_not_overlap() {
    let app = seeded_app().await;
    let page = |offset: u32| {
        RequestBuilder::get(&format!("/products?sort=hardiness&offset={offset}&limit=3")).build()
    };

    let mut seen = Vec::new();
    for offset in [0, 3, 6] {
        let response = app.send(page(offset)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["total"], 7);
        seen.extend(names(&response.body));
    }

    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(seen.len(), 7);
    assert_eq!(unique.len(), 7);
}

#[tokio::test]
async fn test_product_detail() {
    let app = seeded_app().await;

    let found = app.send(RequestBuilder::get("/products/3").build()).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["name"], "Cereus Peruvianus");
    assert_eq!(found.body["sizeDescription"], "Large (up to 180 cm)");

    let missing = app.send(RequestBuilder::get("/products/999").build()).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let garbage = app.send(RequestBuilder::get("/products/cereus").build()).await;
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);
}
