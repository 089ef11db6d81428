//! Integration tests for the cart and order history view models.

use std::time::Duration;

use pocketshop_core::{CartItemId, OrderId, OrderStatus, Timestamp};
use pocketshop_integration_tests::fixtures::{cart_item, order, product};
use pocketshop_integration_tests::{Endpoint, Fault, Harness};
use pocketshop_storefront::SessionStore;
use pocketshop_storefront::view::{CartIntent, CartViewState, OrdersIntent};
use rust_decimal::Decimal;

const SETTLE: Duration = Duration::from_secs(5);

fn seed_cart(h: &Harness) {
    h.backend
        .add_cart_item(cart_item("c1", &h.user.id, product("p1", 1000), 2));
    h.backend
        .add_cart_item(cart_item("c2", &h.user.id, product("p2", 550), 1));
}

// =============================================================================
// Cart view
// =============================================================================

#[tokio::test]
async fn test_anonymous_load_is_not_authenticated() {
    let h = Harness::anonymous();
    let view = h.state.cart_view();
    assert_eq!(view.state(), CartViewState::NotAuthenticated);

    let state = view.dispatch(CartIntent::Load).await;

    assert_eq!(state, CartViewState::NotAuthenticated);
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_anonymous_mutations_are_not_authenticated() {
    let h = Harness::anonymous();
    let view = h.state.cart_view();

    let intents = [
        CartIntent::Add {
            product: product("p1", 1000),
            quantity: 1,
        },
        CartIntent::UpdateQuantity {
            item_id: CartItemId::new("c1"),
            quantity: 2,
        },
        CartIntent::Remove {
            item_id: CartItemId::new("c1"),
        },
        CartIntent::Clear,
        CartIntent::Checkout {
            shipping_address: Some("12 Rue des Fleurs, Rabat".to_string()),
        },
    ];
    for intent in intents {
        let label = format!("{intent:?}");
        assert_eq!(
            view.dispatch(intent).await,
            CartViewState::NotAuthenticated,
            "{label}"
        );
    }
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_session_ending_before_mutation_is_not_authenticated() {
    let h = Harness::logged_in();
    seed_cart(&h);
    let view = h.state.cart_view();
    view.dispatch(CartIntent::Load).await;
    h.backend.reset_calls();

    // Session ends behind the view's back; the next intent must notice
    h.session.clear().await.expect("logout");
    let state = view
        .dispatch(CartIntent::Add {
            product: product("p3", 100),
            quantity: 1,
        })
        .await;

    assert_eq!(state, CartViewState::NotAuthenticated);
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_load_publishes_loading_before_settling() {
    let h = Harness::logged_in();
    seed_cart(&h);
    let view = h.state.cart_view();
    let mut rx = view.subscribe();

    let gate = h.remote.gate_next_cart_load();
    let loading = view.clone();
    let dispatch = tokio::spawn(async move { loading.dispatch(CartIntent::Load).await });

    gate.reached.await.expect("load reached the backend");
    assert_eq!(*rx.borrow_and_update(), CartViewState::Loading);
    assert_eq!(view.state(), CartViewState::Loading);

    gate.release.send(()).expect("load still waiting");
    let settled = dispatch.await.expect("join");

    assert!(matches!(settled, CartViewState::Loaded { item_count: 3, .. }));
    assert_eq!(*rx.borrow_and_update(), settled);
}

#[tokio::test]
async fn test_load_empty_and_loaded() {
    let h = Harness::logged_in();
    let view = h.state.cart_view();

    assert_eq!(view.dispatch(CartIntent::Load).await, CartViewState::Empty);

    seed_cart(&h);
    match view.dispatch(CartIntent::Load).await {
        CartViewState::Loaded {
            items,
            total,
            item_count,
        } => {
            assert_eq!(items.len(), 2);
            assert_eq!(total, Decimal::new(2550, 2));
            assert_eq!(item_count, 3);
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_load_shows_friendly_message() {
    let h = Harness::logged_in();
    h.backend.fail(Endpoint::Cart, Fault::Disconnect);
    let view = h.state.cart_view();

    let state = view.dispatch(CartIntent::Load).await;

    assert_eq!(
        state,
        CartViewState::Error {
            message: "Could not reach the server. Check your connection.".to_string()
        }
    );
    assert_eq!(view.state(), state);
}

#[tokio::test]
async fn test_mutations_settle_on_snapshot_projection() {
    let h = Harness::logged_in();
    seed_cart(&h);
    let view = h.state.cart_view();
    view.dispatch(CartIntent::Load).await;

    let state = view
        .dispatch(CartIntent::UpdateQuantity {
            item_id: CartItemId::new("c2"),
            quantity: 0,
        })
        .await;
    assert!(matches!(state, CartViewState::Loaded { item_count: 2, .. }));

    let state = view
        .dispatch(CartIntent::Add {
            product: product("p3", 100),
            quantity: 1,
        })
        .await;
    assert!(matches!(state, CartViewState::Loaded { item_count: 3, .. }));

    assert_eq!(view.dispatch(CartIntent::Clear).await, CartViewState::Empty);
}

#[tokio::test]
async fn test_checkout_success_then_reload_is_empty() {
    let h = Harness::logged_in();
    seed_cart(&h);
    let view = h.state.cart_view();
    view.dispatch(CartIntent::Load).await;

    let state = view
        .dispatch(CartIntent::Checkout {
            shipping_address: None,
        })
        .await;

    let CartViewState::CheckoutSucceeded { order } = state else {
        panic!("expected CheckoutSucceeded, got {state:?}");
    };
    // Falls back to the profile address
    assert_eq!(order.shipping_address, h.user.address);
    assert_eq!(order.total, Decimal::new(2550, 2));

    assert_eq!(view.dispatch(CartIntent::Load).await, CartViewState::Empty);
}

#[tokio::test]
async fn test_checkout_validation_error_is_shown() {
    let h = Harness::logged_in();
    seed_cart(&h);
    let view = h.state.cart_view();
    view.dispatch(CartIntent::Load).await;

    let state = view
        .dispatch(CartIntent::Checkout {
            shipping_address: Some("short".to_string()),
        })
        .await;

    assert!(matches!(state, CartViewState::Error { .. }));
    assert_eq!(h.backend.calls_to(Endpoint::CreateOrder), 0);
}

#[tokio::test]
async fn test_follow_session_reloads_on_login_and_resets_on_logout() {
    let h = Harness::anonymous();
    seed_cart(&h);
    let view = h.state.cart_view();
    let mut rx = view.subscribe();
    let follower = view.follow_session(h.state.session());

    h.session.save(&h.user).await.expect("login");
    tokio::time::timeout(
        SETTLE,
        rx.wait_for(|s| matches!(s, CartViewState::Loaded { .. })),
    )
    .await
    .expect("settled in time")
    .expect("view alive");

    h.session.clear().await.expect("logout");
    tokio::time::timeout(
        SETTLE,
        rx.wait_for(|s| *s == CartViewState::NotAuthenticated),
    )
    .await
    .expect("settled in time")
    .expect("view alive");

    assert!(h.state.cart().snapshot().is_empty());
    follower.abort();
}

// =============================================================================
// Orders view
// =============================================================================

#[tokio::test]
async fn test_orders_load() {
    let h = Harness::logged_in();
    h.backend
        .add_order(order("o1", &h.user.id, Timestamp::Epoch(1), OrderStatus::Delivered));
    h.backend
        .add_order(order("o2", &h.user.id, Timestamp::Epoch(2), OrderStatus::Pending));
    let view = h.state.orders_view();

    let state = view.dispatch(OrdersIntent::Load).await;

    assert!(!state.is_loading);
    assert!(state.error.is_none());
    let ids: Vec<&str> = state.orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["o2", "o1"]);
}

#[tokio::test]
async fn test_orders_empty() {
    let h = Harness::logged_in();
    let view = h.state.orders_view();

    let state = view.dispatch(OrdersIntent::Load).await;

    assert!(state.is_empty());
}

#[tokio::test]
async fn test_refresh_failure_keeps_list_and_sets_error() {
    let h = Harness::logged_in();
    h.backend
        .add_order(order("o1", &h.user.id, Timestamp::Epoch(1), OrderStatus::Pending));
    let view = h.state.orders_view();
    view.dispatch(OrdersIntent::Load).await;

    h.backend.fail(Endpoint::UserOrders, Fault::Timeout);
    h.backend.fail(Endpoint::Orders, Fault::Timeout);
    let state = view.dispatch(OrdersIntent::Refresh).await;

    assert!(!state.is_refreshing);
    assert_eq!(state.orders.len(), 1);
    assert_eq!(
        state.error.as_deref(),
        Some("The server took too long to respond.")
    );

    let state = view.dispatch(OrdersIntent::ClearError).await;
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_cancel_reloads_list() {
    let h = Harness::logged_in();
    h.backend
        .add_order(order("o1", &h.user.id, Timestamp::Epoch(1), OrderStatus::Pending));
    let view = h.state.orders_view();
    view.dispatch(OrdersIntent::Load).await;

    let state = view.dispatch(OrdersIntent::Cancel(OrderId::new("o1"))).await;

    assert!(state.error.is_none());
    assert_eq!(state.orders[0].status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_unlisted_order_sets_error() {
    let h = Harness::logged_in();
    let view = h.state.orders_view();

    let state = view.dispatch(OrdersIntent::Cancel(OrderId::new("ghost"))).await;

    assert_eq!(state.error.as_deref(), Some("Order not found."));
    assert_eq!(h.backend.calls_to(Endpoint::CancelOrder), 0);
}

#[tokio::test]
async fn test_reorder_adds_to_list() {
    let h = Harness::logged_in();
    h.backend.add_product(product("p1", 1000));
    h.backend
        .add_order(order("o1", &h.user.id, Timestamp::Epoch(1), OrderStatus::Delivered));
    let view = h.state.orders_view();
    view.dispatch(OrdersIntent::Load).await;

    let state = view.dispatch(OrdersIntent::Reorder(OrderId::new("o1"))).await;

    assert_eq!(state.orders.len(), 2);
    assert_eq!(state.orders[0].status, OrderStatus::Pending);
}
