//! End-to-end order submission against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::SecretString;

use preciosa_core::{OrderId, PaymentMethod, Price, PriceTier, ProductId};
use preciosa_integration_tests::{FakeBackend, PASSWORD, RecordingOpener, TOKEN, USER_ID};
use preciosa_storefront::AppState;
use preciosa_storefront::backend::{BestEffortExt, Credentials};
use preciosa_storefront::config::CheckoutPolicy;

async fn fill_cart(state: &mut AppState) {
    let blusa = state.api().get_product(&ProductId::new("P001")).await.unwrap();
    let vestido = state.api().get_product(&ProductId::new("P002")).await.unwrap();
    state
        .add_to_cart(&blusa, Some(PriceTier::Wholesale), 2)
        .unwrap();
    state
        .add_to_cart(&vestido, Some(PriceTier::Wholesale), 1)
        .unwrap();
}

#[tokio::test]
async fn test_guest_order_reaches_backend_and_whatsapp() {
    let backend = FakeBackend::start().await.unwrap();
    let mut state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();
    fill_cart(&mut state).await;
    assert_eq!(state.cart().total(), Price::from_cents(12_000));

    let opener = RecordingOpener::default();
    let receipt = state.checkout(PaymentMethod::Pix, &opener).await.unwrap();

    assert_eq!(receipt.remote.as_ref().unwrap(), &OrderId::new("srv-1"));
    assert!(receipt.saved_locally);
    assert!(receipt.link_opened);
    assert!(receipt.link.message().contains("Total: *R$ 120,00*"));
    assert_eq!(opener.opened(), vec![receipt.link.url()]);
    assert!(state.cart().is_empty());
    assert_eq!(state.history().entries().len(), 1);

    let posts = backend.requests_to("/api/orders");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].authorization, None);

    let body = posts[0].body.as_ref().unwrap();
    assert_eq!(body["id"], receipt.order.id.as_str());
    assert_eq!(body["total"].as_f64(), Some(120.0));
    assert_eq!(body["channel"], "whatsapp");
    assert_eq!(body["status"], "pendente");
    assert_eq!(body["payment_method"], "pix");
    assert!(body["created_at"].is_i64());

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product_id"], "P001");
    assert_eq!(items[0]["sku"], "PM-001");
    assert_eq!(items[0]["qty"], 2);
    assert_eq!(items[0]["price"].as_f64(), Some(40.0));
    assert_eq!(items[0]["tipo"], "atacado");
    // No SKU in the catalog: the product id stands in
    assert_eq!(items[1]["sku"], "P002");

    let user = &body["user"];
    assert_eq!(user["guest"], true);
    assert_eq!(user["nome"], "Cliente");
    assert!(user.get("user_id").is_none());
}

#[tokio::test]
async fn test_backend_failure_does_not_block_whatsapp() {
    let backend = FakeBackend::start().await.unwrap();
    backend.set_orders_down(true);
    let mut state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();
    fill_cart(&mut state).await;

    let opener = RecordingOpener::default();
    let receipt = state.checkout(PaymentMethod::Boleto, &opener).await.unwrap();

    assert!(!receipt.remote.is_remote());
    assert_eq!(receipt.remote.value(), &receipt.order.id);
    assert!(receipt.link_opened);
    assert!(receipt.saved_locally);
    assert_eq!(opener.opened().len(), 1);
    assert!(state.cart().is_empty());
    assert_eq!(state.history().recent()[0].id, receipt.order.id);
}

#[tokio::test]
async fn test_failed_link_is_reported_and_cart_cleared() {
    let backend = FakeBackend::start().await.unwrap();
    let mut state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();
    fill_cart(&mut state).await;

    let opener = RecordingOpener::failing();
    let receipt = state.checkout(PaymentMethod::Card, &opener).await.unwrap();

    assert!(!receipt.link_opened);
    assert!(receipt.remote.is_remote());
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_logged_in_order_carries_buyer_and_token() {
    let backend = FakeBackend::start().await.unwrap();
    let mut state = backend.state(CheckoutPolicy::SessionRequired).unwrap();

    state
        .login(Credentials {
            login: "ana@example.com".parse().unwrap(),
            password: SecretString::from(PASSWORD),
            phone: None,
        })
        .await
        .unwrap()
        .unwrap();
    fill_cart(&mut state).await;

    let opener = RecordingOpener::default();
    state.checkout(PaymentMethod::Pix, &opener).await.unwrap();

    let posts = backend.requests_to("/api/orders");
    assert_eq!(posts[0].authorization.as_deref(), Some(format!("Bearer {TOKEN}").as_str()));
    let user = &posts[0].body.as_ref().unwrap()["user"];
    assert_eq!(user["user_id"], USER_ID);
    assert_eq!(user["nome"], "Ana Souza");
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["guest"], false);
}

#[tokio::test]
async fn test_empty_cart_sends_nothing() {
    let backend = FakeBackend::start().await.unwrap();
    let mut state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();

    let opener = RecordingOpener::default();
    assert!(state.checkout(PaymentMethod::Pix, &opener).await.is_err());
    assert!(backend.requests_to("/api/orders").is_empty());
    assert!(opener.opened().is_empty());
    assert!(state.history().entries().is_empty());
}
