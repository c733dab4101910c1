//! Product ratings through the rating service and its cache.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{MockBackend, PASSWORD, product_json};
use bazaar_storefront::api::ApiError;
use secrecy::SecretString;

#[tokio::test]
async fn test_submit_then_read_back() {
    let mock = MockBackend::start().await.unwrap();
    mock.add_product(product_json("1", "Cotton Kurta", 750, 1000));
    mock.with(|b| b.ratings.insert("1".to_string(), vec![5, 3]));
    let state = mock.storefront().unwrap();
    state
        .auth()
        .login("asha@example.com", &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    let id = "1".into();

    assert!(state.ratings().mine(&id).await.unwrap().is_none());
    let stats = state.ratings().stats(&id).await.unwrap();
    assert_eq!(stats.total_ratings, 2);
    state.ratings().stats(&id).await.unwrap();
    assert_eq!(mock.count("GET /api/products/1/ratings/stats"), 1);

    let saved = state.ratings().submit(&id, 4, Some("Lovely fabric")).await.unwrap();
    assert_eq!(saved.rating, 4);

    let mine = state.ratings().mine(&id).await.unwrap().unwrap();
    assert_eq!(mine.review_text.as_deref(), Some("Lovely fabric"));

    // Submitting drops the cached aggregate.
    let stats = state.ratings().stats(&id).await.unwrap();
    assert_eq!(stats.total_ratings, 3);
    assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(stats.star_distribution.get(&4), Some(&1));
    assert_eq!(mock.count("GET /api/products/1/ratings/stats"), 2);
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected() {
    let mock = MockBackend::start().await.unwrap();
    mock.add_product(product_json("1", "Cotton Kurta", 750, 1000));
    let state = mock.storefront().unwrap();

    let err = state.ratings().submit(&"1".into(), 0, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}
