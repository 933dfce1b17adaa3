//! Cart editing, login and session handling against the mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use furnistore_core::{CartItemId, ProductId};
use furnistore_integration_tests::{DEMO_PASSWORD, DEMO_USERNAME, TestContext};
use furnistore_storefront::ApiError;
use furnistore_storefront::CheckoutError;
use furnistore_storefront::Language;
use furnistore_storefront::api::{CartStore, LoginOutcome};
use furnistore_storefront::checkout::Notice;
use secrecy::SecretString;

#[tokio::test]
async fn test_seeded_cart_is_normalized() {
    let ctx = TestContext::new().await;

    let cart = ctx.orchestrator.load_cart().await.unwrap();

    assert_eq!(cart.lines.len(), 2);
    let sofa = &cart.lines[0];
    assert_eq!(sofa.display_name, "Modern Sofa");
    assert_eq!(sofa.display_name_zh.as_deref(), Some("現代沙發"));
    assert_eq!(sofa.image_ref.as_deref(), Some("/images/sofa1.jpg"));
    assert_eq!(sofa.line_total().unwrap().to_string(), "$1799.98");
    assert_eq!(cart.total().unwrap().to_string(), "$2399.97");
    assert_eq!(ctx.cart.get(), cart);
}

#[tokio::test]
async fn test_catalog_browsing_without_session() {
    let ctx = TestContext::signed_out(Duration::from_secs(15)).await;

    let products = ctx.client.list_products(Language::ZhHant).await.unwrap();
    assert_eq!(products.len(), 3);
    let chair = &products[2];
    assert_eq!(chair.display_name(Language::ZhHant), "辦公椅");
    assert_eq!(chair.price.to_string(), "$299.99");
    assert_eq!(chair.image_ref.as_deref(), Some("/images/chair1.jpg"));

    let table = ctx.client.fetch_product(ProductId::new(2)).await.unwrap();
    assert_eq!(table.name, "Dining Table");

    match ctx.client.fetch_product(ProductId::new(99)).await {
        Err(ApiError::Status { status: 404, message }) => {
            assert_eq!(message.as_deref(), Some("Product not found"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_cart_edits_update_display() {
    let ctx = TestContext::new().await;

    let cart = ctx
        .orchestrator
        .add_to_cart(ProductId::new(3), 1)
        .await
        .unwrap();
    assert_eq!(cart.lines.len(), 3);
    assert_eq!(cart.total().unwrap().to_string(), "$2699.96");

    let cart = ctx
        .orchestrator
        .update_cart_item(CartItemId::new(1), 0)
        .await
        .unwrap();
    assert_eq!(cart.line(CartItemId::new(1)).unwrap().quantity, 1);

    let cart = ctx
        .orchestrator
        .remove_cart_item(CartItemId::new(2))
        .await
        .unwrap();
    assert_eq!(cart.lines.len(), 2);
    assert_eq!(ctx.cart.get(), cart);
}

#[tokio::test]
async fn test_cart_edit_failure_shows_server_message() {
    let ctx = TestContext::new().await;
    ctx.orchestrator.load_cart().await.unwrap();

    let err = ctx
        .orchestrator
        .remove_cart_item(CartItemId::new(42))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::CartUpdate(_)));
    assert_eq!(
        ctx.ui.notices(),
        vec![Notice::failure("Cart item not found")]
    );
    assert_eq!(ctx.cart.get().lines.len(), 2);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected_by_client() {
    let ctx = TestContext::new().await;

    let err = ctx
        .client
        .update_item(CartItemId::new(1), 0)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Rejected(Some(_))));
}

#[tokio::test]
async fn test_login_and_logout() {
    let ctx = TestContext::signed_out(Duration::from_secs(15)).await;
    let mut changes = ctx.session.subscribe();

    let denied = ctx
        .client
        .login(DEMO_USERNAME, &SecretString::from("wrong"))
        .await
        .unwrap();
    assert!(matches!(denied, LoginOutcome::InvalidCredentials(_)));
    assert!(!ctx.session.is_signed_in());

    let outcome = ctx
        .client
        .login(DEMO_USERNAME, &SecretString::from(DEMO_PASSWORD))
        .await
        .unwrap();
    let LoginOutcome::SignedIn(user) = outcome else {
        panic!("expected sign-in");
    };
    assert_eq!(user.username, DEMO_USERNAME);
    assert!(changes.has_changed().unwrap());
    drop(changes.borrow_and_update());
    assert!(ctx.session.is_authenticated());

    let profile = ctx.client.fetch_profile().await.unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Tai Man"));

    ctx.client.logout();
    assert!(changes.has_changed().unwrap());
    assert!(!ctx.session.is_signed_in());
}

#[tokio::test]
async fn test_signed_out_requests_are_unauthorized() {
    let ctx = TestContext::signed_out(Duration::from_secs(15)).await;

    let err = ctx.client.fetch_cart().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(matches!(
        ctx.orchestrator.load_cart().await,
        Err(CheckoutError::Auth)
    ));
}
