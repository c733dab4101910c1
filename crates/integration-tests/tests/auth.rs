//! Login, session restore across restarts, and logout.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_core::UserType;
use bazaar_integration_tests::{MockBackend, PASSWORD};
use bazaar_storefront::api::Registration;
use bazaar_storefront::storage::{MemoryTokenStorage, TOKEN_KEY, TokenStorage};
use secrecy::SecretString;

fn password() -> SecretString {
    SecretString::from(PASSWORD.to_string())
}

#[tokio::test]
async fn test_login_populates_auth_slice() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    let user = state.auth().login("asha@example.com", &password()).await.unwrap();
    assert_eq!(user.name.as_deref(), Some("Asha Rao"));
    assert_eq!(user.user_type, UserType::User);

    let (authenticated, loading, error) = state
        .store()
        .select(|s| (s.auth.is_authenticated, s.auth.loading, s.auth.error.clone()));
    assert!(authenticated);
    assert!(!loading);
    assert!(error.is_none());
    assert!(state.auth().require_user().is_ok());
}

#[tokio::test]
async fn test_failed_login_records_message() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    let err = state
        .auth()
        .login("asha@example.com", &SecretString::from("wrong".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Invalid email or password");

    let (authenticated, error) = state
        .store()
        .select(|s| (s.auth.is_authenticated, s.auth.error.clone()));
    assert!(!authenticated);
    assert_eq!(error.as_deref(), Some("Invalid email or password"));
}

#[tokio::test]
async fn test_malformed_email_is_rejected_locally() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    assert!(state.auth().login("not-an-email", &password()).await.is_err());
    assert_eq!(mock.count("POST /api/auth/login"), 0);
}

#[tokio::test]
async fn test_register_signs_in_and_persists() {
    let mock = MockBackend::start().await.unwrap();
    let storage: Arc<MemoryTokenStorage> = Arc::new(MemoryTokenStorage::new());
    let state = mock.storefront_with(storage.clone()).unwrap();

    let mut registration = Registration::new("ravi@example.com", password());
    registration.first_name = Some("Ravi".to_string());
    registration.last_name = Some("Kumar".to_string());
    let user = state.auth().register(&registration).await.unwrap();

    assert_eq!(user.name.as_deref(), Some("Ravi Kumar"));
    assert_eq!(user.email.as_deref(), Some("ravi@example.com"));
    assert_eq!(user.user_type, UserType::User);
    assert!(state.auth().is_authenticated());
    assert!(storage.load(TOKEN_KEY).unwrap().is_some());
    assert_eq!(
        mock.with(|b| b.user["username"].clone()),
        serde_json::json!("ravi")
    );

    // The new token is accepted on protected routes.
    state.wishlist().load().await.unwrap();
    assert_eq!(mock.count("POST /api/auth/refresh"), 0);
}

#[tokio::test]
async fn test_register_taken_email_records_message() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    let err = state
        .auth()
        .register(&Registration::new("asha@example.com", password()))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "User with this email already exists");
    assert!(!state.auth().is_authenticated());
    assert_eq!(
        state.store().select(|s| s.auth.error.clone()).as_deref(),
        Some("User with this email already exists")
    );
}

#[tokio::test]
async fn test_register_validates_locally() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    let bad_email = Registration::new("ravi", password());
    assert!(state.auth().register(&bad_email).await.is_err());
    let no_password = Registration::new("ravi@example.com", SecretString::from(String::new()));
    assert!(state.auth().register(&no_password).await.is_err());
    assert_eq!(mock.count("POST /api/auth/register"), 0);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let mock = MockBackend::start().await.unwrap();
    let storage: Arc<MemoryTokenStorage> = Arc::new(MemoryTokenStorage::new());

    let first = mock.storefront_with(storage.clone()).unwrap();
    first.auth().login("asha@example.com", &password()).await.unwrap();
    drop(first);

    let second = mock.storefront_with(storage).unwrap();
    let user = second.auth().restore().await.unwrap().unwrap();
    assert_eq!(user.email.as_deref(), Some("asha@example.com"));
    assert!(second.auth().is_authenticated());
}

#[tokio::test]
async fn test_rejected_stored_session_is_dropped() {
    let mock = MockBackend::start().await.unwrap();
    let storage: Arc<MemoryTokenStorage> = Arc::new(MemoryTokenStorage::new());

    let first = mock.storefront_with(storage.clone()).unwrap();
    first.auth().login("asha@example.com", &password()).await.unwrap();
    mock.revoke_session();

    let second = mock.storefront_with(storage.clone()).unwrap();
    assert!(second.auth().restore().await.unwrap().is_none());
    assert!(!second.auth().is_authenticated());
    assert!(storage.load(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_restore_without_stored_session() {
    let mock = MockBackend::start().await.unwrap();
    let state = mock.storefront().unwrap();

    assert!(state.auth().restore().await.unwrap().is_none());
    assert_eq!(mock.count("GET /api/auth/me"), 0);
}

#[tokio::test]
async fn test_logout_clears_session_bag_and_wishlist() {
    let mock = MockBackend::start().await.unwrap();
    mock.add_product(bazaar_integration_tests::product_json("1", "Cotton Kurta", 750, 1000));
    mock.with(|b| b.wishlist.push("1".to_string()));
    let storage: Arc<MemoryTokenStorage> = Arc::new(MemoryTokenStorage::new());
    let state = mock.storefront_with(storage.clone()).unwrap();
    state.auth().login("asha@example.com", &password()).await.unwrap();
    state.wishlist().load().await.unwrap();
    state
        .bag()
        .add(&bazaar_storefront::api::NewBagItem::single("1".into()))
        .await
        .unwrap();

    state.auth().logout();

    let (authenticated, wishlist, bag) = state.store().select(|s| {
        (
            s.auth.is_authenticated,
            s.data.home.wishlist.len(),
            s.bag.items.len(),
        )
    });
    assert!(!authenticated);
    assert_eq!(wishlist, 0);
    assert_eq!(bag, 0);
    assert!(storage.load(TOKEN_KEY).unwrap().is_none());
    assert!(state.auth().require_user().is_err());
}
