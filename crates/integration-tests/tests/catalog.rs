//! Catalog reads through the cache, client-side filters and admin actions.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_core::{ApprovalStatus, Price};
use bazaar_integration_tests::{MockBackend, PASSWORD, product_json};
use bazaar_storefront::api::ProductDraft;
use bazaar_storefront::store::selectors;
use secrecy::SecretString;
use serde_json::json;

async fn seeded() -> MockBackend {
    let mock = MockBackend::start().await.unwrap();
    let mut kurta = product_json("1", "Cotton Kurta", 1000, 1500);
    kurta["categories"] = json!([{ "id": "1", "name": "Fashion" }]);
    mock.add_product(kurta);
    mock.add_product(product_json("2", "Desk Lamp", 1040, 1200));
    let mut pending = product_json("3", "Unreviewed Scarf", 300, 400);
    pending["approval_status"] = json!("pending");
    mock.add_product(pending);
    mock
}

#[tokio::test]
async fn test_home_products_hide_unapproved_listings() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();

    let products = state.catalog().home_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p.approval_status == ApprovalStatus::Approved));

    let (stored, loading) = state
        .store()
        .select(|s| (s.data.home.products.len(), s.data.loading));
    assert_eq!(stored, 2);
    assert!(!loading);
}

#[tokio::test]
async fn test_home_products_are_cached_until_refresh() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();

    state.catalog().home_products().await.unwrap();
    state.catalog().home_products().await.unwrap();
    assert_eq!(mock.count("GET /api/products"), 1);

    mock.add_product(product_json("4", "Brass Diya", 250, 300));
    let products = state.catalog().refresh().await.unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(mock.count("GET /api/products"), 2);
}

#[tokio::test]
async fn test_failed_load_records_error() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();
    mock.fail("GET /api/products");

    assert!(state.catalog().home_products().await.is_err());
    let (error, loading) = state
        .store()
        .select(|s| (s.data.error.clone(), s.data.loading));
    assert_eq!(error.as_deref(), Some("Injected failure"));
    assert!(!loading);

    mock.recover("GET /api/products");
    state.catalog().home_products().await.unwrap();
    assert!(state.store().select(|s| s.data.error.is_none()));
}

#[tokio::test]
async fn test_product_detail_is_cached() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();

    let product = state.catalog().product(&"1".into()).await.unwrap();
    assert_eq!(product.name, "Cotton Kurta");
    state.catalog().product(&"1".into()).await.unwrap();
    assert_eq!(mock.count("GET /api/products/1"), 1);
    assert!(
        state
            .store()
            .select(|s| selectors::product(s, &"1".into()).is_some())
    );
}

#[tokio::test]
async fn test_price_filter_includes_commission() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();
    state.catalog().home_products().await.unwrap();
    let rates = state.catalog().commission_rates().await.unwrap();

    // Kurta: 1000 + 10% Fashion commission = 1100. Lamp has no category.
    let names: Vec<String> = state.store().select(|s| {
        selectors::products_in_price_range(s, None, Some(Price::from_rupees(1050)), Some(&rates))
            .into_iter()
            .map(|p| p.name.clone())
            .collect()
    });
    assert_eq!(names, vec!["Desk Lamp".to_string()]);

    let fashion = state
        .store()
        .select(|s| selectors::products_in_category(s, "fashion").len());
    assert_eq!(fashion, 1);
}

#[tokio::test]
async fn test_categories_and_commissions() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();

    let categories = state.catalog().categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    state.catalog().categories().await.unwrap();
    assert_eq!(mock.count("GET /api/categories"), 1);

    let rates = state.catalog().commission_rates().await.unwrap();
    assert!(!rates.is_empty());
}

#[tokio::test]
async fn test_listing_lifecycle() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();
    state
        .auth()
        .login("seller@example.com", &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    state.catalog().home_products().await.unwrap();

    let draft = ProductDraft {
        name: "Hand-thrown Mug".to_string(),
        specification: "Stoneware, 350ml".to_string(),
        highlights: vec!["Dishwasher safe".to_string()],
        selling_price: Price::from_rupees(400),
        max_price: Price::from_rupees(500),
        quantity: Some(12),
        thumbnail: None,
        gallery: Vec::new(),
        categories: vec!["Home & Decor".to_string()],
    };
    let created = state.products().create(&draft).await.unwrap();
    assert_eq!(created.approval_status, ApprovalStatus::Pending);
    assert!(state.store().select(|s| selectors::product(s, &created.id).is_none()));

    let pending = state.products().pending().await.unwrap();
    assert_eq!(pending.len(), 2);

    state.products().approve(&created.id).await.unwrap();
    let catalog = state.catalog().home_products().await.unwrap();
    assert!(catalog.iter().any(|p| p.id == created.id));
    assert_eq!(mock.count("GET /api/products"), 2);

    state.products().reject(&"3".into(), Some("Blurry photos")).await.unwrap();
    assert_eq!(
        mock.with(|b| b.products[2]["rejection_reason"].clone()),
        json!("Blurry photos")
    );

    state.products().delete(&created.id).await.unwrap();
    assert!(state.store().select(|s| selectors::product(s, &created.id).is_none()));
}

#[tokio::test]
async fn test_invalid_draft_is_not_sent() {
    let mock = seeded().await;
    let state = mock.storefront().unwrap();
    state
        .auth()
        .login("seller@example.com", &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();

    let draft = ProductDraft {
        name: "Overpriced".to_string(),
        specification: String::new(),
        highlights: Vec::new(),
        selling_price: Price::from_rupees(600),
        max_price: Price::from_rupees(500),
        quantity: None,
        thumbnail: None,
        gallery: Vec::new(),
        categories: Vec::new(),
    };
    assert!(state.products().create(&draft).await.is_err());
    assert_eq!(mock.count("POST /api/products"), 0);
}
