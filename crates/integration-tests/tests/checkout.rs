//! QR pickup checkout from the bag.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_core::OrderStatus;
use bazaar_integration_tests::{MockBackend, PASSWORD, product_json};
use bazaar_storefront::AppState;
use bazaar_storefront::api::{ApiError, NewBagItem};
use secrecy::SecretString;
use serde_json::json;

async fn signed_in() -> (MockBackend, AppState) {
    let mock = MockBackend::start().await.unwrap();
    mock.add_product(product_json("1", "Cotton Kurta", 750, 1000));
    let mut lamp = product_json("2", "Desk Lamp", 1200, 1200);
    lamp["stock_quantity"] = json!(1);
    mock.add_product(lamp);
    let state = mock.storefront().unwrap();
    state
        .auth()
        .login("asha@example.com", &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    (mock, state)
}

async fn add(state: &AppState, product_id: &str, quantity: u32) {
    let mut item = NewBagItem::single(product_id.into());
    item.quantity = quantity;
    state.bag().add(&item).await.unwrap();
}

#[tokio::test]
async fn test_checkout_places_orders_and_empties_bag() {
    let (mock, state) = signed_in().await;
    add(&state, "1", 2).await;
    add(&state, "2", 1).await;

    let orders = state
        .checkout()
        .checkout(Some("Main gate".to_string()))
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.status == OrderStatus::Pending));
    assert!(orders.iter().all(|o| o.qr_code_data.is_some()));
    assert_eq!(orders[0].quantity, 2);

    assert!(state.store().select(|s| s.bag.items.is_empty()));
    assert!(mock.with(|b| b.bag.is_empty()));
    assert_eq!(
        mock.with(|b| b.orders[0]["pickup_location"].clone()),
        json!("Main gate")
    );

    let history = state.checkout().orders().await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_refused_line_stops_checkout_and_keeps_rest_of_bag() {
    let (mock, state) = signed_in().await;
    add(&state, "1", 1).await;
    add(&state, "2", 3).await;

    let err = state.checkout().checkout(None).await.unwrap_err();
    assert_eq!(err.message(), "Insufficient stock");
    assert_eq!(err.status(), Some(400));

    // The placed order's line is gone; the refused line stays.
    assert_eq!(mock.with(|b| b.orders.len()), 1);
    let remaining = state.store().select(|s| s.bag.items.clone());
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_id.as_str(), "2");
    assert_eq!(mock.with(|b| b.bag.len()), 1);
    assert_eq!(mock.count("DELETE /api/bag/clear"), 0);
}

#[tokio::test]
async fn test_retry_after_refusal_orders_each_product_once() {
    let (mock, state) = signed_in().await;
    add(&state, "1", 1).await;
    add(&state, "2", 3).await;
    state.checkout().checkout(None).await.unwrap_err();

    let lamp = state.store().select(|s| s.bag.items[0].id.clone());
    state.bag().set_quantity(&lamp, 1).await.unwrap();
    let orders = state.checkout().checkout(None).await.unwrap();
    assert_eq!(orders.len(), 1);

    let ordered: Vec<String> = mock.with(|b| {
        b.orders
            .iter()
            .map(|o| bazaar_integration_tests::id_of(&o["product_id"]))
            .collect()
    });
    assert_eq!(ordered, vec!["1".to_string(), "2".to_string()]);
    assert!(state.store().select(|s| s.bag.items.is_empty()));
    assert!(mock.with(|b| b.bag.is_empty()));
}

#[tokio::test]
async fn test_empty_bag_is_rejected_locally() {
    let (mock, state) = signed_in().await;
    let err = state.checkout().checkout(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.message(), "Your bag is empty");
    assert_eq!(mock.count("POST /api/orders"), 0);
}
