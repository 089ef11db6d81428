//! Integration tests for checkout.

use pocketshop_core::{CartItemId, OrderStatus};
use pocketshop_integration_tests::fixtures::{cart_item, product};
use pocketshop_integration_tests::{Endpoint, Fault, Harness};
use pocketshop_storefront::{Error, RemoteError};
use rust_decimal::Decimal;

const ADDRESS: &str = "12 Rue des Fleurs, Rabat";

async fn loaded_cart() -> Harness {
    let h = Harness::logged_in();
    h.backend
        .add_cart_item(cart_item("c1", &h.user.id, product("p1", 37_900), 2));
    h.backend
        .add_cart_item(cart_item("c2", &h.user.id, product("p2", 2_195), 3));
    h.state.cart().load().await.expect("load");
    h.backend.reset_calls();
    h
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let h = loaded_cart().await;
    let expected_total = h.state.cart().total();

    let order = h.state.checkout().checkout(ADDRESS).await.expect("checkout");

    assert_eq!(order.total, expected_total);
    assert_eq!(order.total, Decimal::new(82_385, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.shipping_address, ADDRESS);
    assert_eq!(order.products.len(), 2);
    assert!(h.state.cart().snapshot().is_empty());
    assert!(h.backend.cart_of(&h.user.id).is_empty());
    assert_eq!(h.backend.orders_snapshot(), vec![order]);
}

#[tokio::test]
async fn test_checkout_freezes_prices_from_snapshot() {
    let h = loaded_cart().await;

    let order = h.state.checkout().checkout(ADDRESS).await.expect("checkout");

    let line = order
        .products
        .iter()
        .find(|line| line.product_id.as_str() == "p2")
        .expect("p2 line");
    assert_eq!(line.price, Decimal::new(2_195, 2));
    assert_eq!(line.quantity, 3);
}

#[tokio::test]
async fn test_invalid_address_makes_no_call() {
    for address in ["", "   ", "Rabat 123", "Fès Médin"] {
        let h = loaded_cart().await;

        let err = h
            .state
            .checkout()
            .checkout(address)
            .await
            .expect_err("invalid address");

        assert!(matches!(err, Error::Validation(_)), "address {address:?}");
        assert_eq!(h.backend.call_count(), 0, "address {address:?}");
        assert_eq!(h.state.cart().snapshot().len(), 2);
    }
}

#[tokio::test]
async fn test_ten_character_address_is_accepted() {
    let h = loaded_cart().await;

    let order = h
        .state
        .checkout()
        .checkout("Rabat 1234")
        .await
        .expect("checkout");

    assert_eq!(order.shipping_address, "Rabat 1234");
}

#[tokio::test]
async fn test_empty_cart_makes_no_call() {
    let h = Harness::logged_in();

    let err = h
        .state
        .checkout()
        .checkout(ADDRESS)
        .await
        .expect_err("empty cart");

    assert!(matches!(err, Error::EmptyCart));
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_checkout_without_session() {
    let h = Harness::anonymous();

    let err = h
        .state
        .checkout()
        .checkout(ADDRESS)
        .await
        .expect_err("anonymous");

    assert!(matches!(err, Error::NotAuthenticated));
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_rejected_order_leaves_cart_untouched() {
    let h = loaded_cart().await;
    let before = h.state.cart().snapshot();
    h.backend.fail(Endpoint::CreateOrder, Fault::Status(500));

    let err = h
        .state
        .checkout()
        .checkout(ADDRESS)
        .await
        .expect_err("order rejected");

    assert!(matches!(err, Error::Remote(RemoteError::Status { status: 500, .. })));
    assert_eq!(h.state.cart().snapshot(), before);
    assert_eq!(h.backend.calls_to(Endpoint::ClearCart), 0);
    assert_eq!(h.backend.cart_of(&h.user.id).len(), 2);
}

#[tokio::test]
async fn test_order_placed_but_clear_failed_surfaces_error() {
    let h = loaded_cart().await;
    h.backend.disable_bulk_clear();
    h.backend
        .fail_nth(Endpoint::DeleteCartItem, 2, Fault::Status(500));

    let err = h
        .state
        .checkout()
        .checkout(ADDRESS)
        .await
        .expect_err("clear fails");

    assert!(matches!(err, Error::Remote(RemoteError::Status { status: 500, .. })));
    assert_eq!(h.backend.orders_snapshot().len(), 1);
    // The snapshot matches what the server still holds
    assert_eq!(
        h.state
            .cart()
            .snapshot()
            .items()
            .iter()
            .map(|item| item.id.clone())
            .collect::<Vec<_>>(),
        vec![CartItemId::new("c2")]
    );
}
