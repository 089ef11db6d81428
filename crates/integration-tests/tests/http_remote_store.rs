//! Integration tests for `HttpRemoteStore` against a local REST server.

use std::sync::Arc;
use std::time::Duration;

use pocketshop_core::{CartItemId, OrderStatus, Timestamp, User, UserId};
use pocketshop_integration_tests::fixtures::{cart_item, order, product, user};
use pocketshop_integration_tests::{Backend, Call, Endpoint, Fault, server};
use pocketshop_storefront::{
    AppState, ClientConfig, Error, HttpRemoteStore, MemorySessionStore, RemoteError, RemoteStore,
    Session,
};
use url::Url;

struct Served {
    backend: Arc<Backend>,
    state: AppState,
    remote: HttpRemoteStore,
    user: User,
}

async fn serve_with(user: User, timeout: Duration) -> Served {
    let backend = Arc::new(Backend::new());
    backend.add_user(user.clone());
    let url = server::spawn(Arc::clone(&backend)).await.expect("bind server");

    let mut config = ClientConfig::new(url);
    config.request_timeout = timeout;
    let remote = HttpRemoteStore::new(&config).expect("client");
    let session = Arc::new(MemorySessionStore::with_session(Session::logged_in(
        user.clone(),
    )));
    let state = AppState::new(config, Arc::new(remote.clone()), session);

    Served {
        backend,
        state,
        remote,
        user,
    }
}

async fn serve() -> Served {
    serve_with(user("u1"), Duration::from_secs(5)).await
}

#[tokio::test]
async fn test_products_over_http() {
    let s = serve().await;
    s.backend.add_product(product("p1", 37_900));
    s.backend.add_product(product("p2", 2_195));

    let products = s.state.catalog().products().await.expect("products");

    assert_eq!(products.len(), 2);
    assert_eq!(products[1].price, rust_decimal::Decimal::new(2_195, 2));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let s = serve().await;

    let err = s
        .remote
        .product(&pocketshop_core::ProductId::new("missing"))
        .await
        .expect_err("404");

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_cart_round_trip_over_http() {
    let s = serve().await;

    let added = s
        .state
        .cart()
        .add(&product("p1", 1000), 2)
        .await
        .expect("add");
    s.state.cart().load().await.expect("load");

    assert_eq!(s.state.cart().snapshot().items(), &[added]);
    assert_eq!(s.backend.cart_of(&s.user.id).len(), 1);
}

#[tokio::test]
async fn test_user_id_query_is_encoded() {
    let odd = user("u 1&x=y");
    let s = serve_with(odd.clone(), Duration::from_secs(5)).await;
    s.backend
        .add_cart_item(cart_item("c1", &odd.id, product("p1", 100), 1));

    let items = s.remote.cart(&odd.id).await.expect("cart");

    assert_eq!(items.len(), 1);
    assert_eq!(s.backend.calls(), vec![Call::Cart(UserId::new("u 1&x=y"))]);
}

#[tokio::test]
async fn test_clear_falls_back_when_bulk_endpoint_missing() {
    let s = serve().await;
    for id in ["c1", "c2", "c3"] {
        s.backend
            .add_cart_item(cart_item(id, &s.user.id, product(&format!("p-{id}"), 100), 1));
    }
    s.state.cart().load().await.expect("load");
    s.backend.disable_bulk_clear();
    s.backend
        .fail_nth(Endpoint::DeleteCartItem, 2, Fault::Status(500));

    let err = s.state.cart().clear().await.expect_err("second delete fails");

    assert!(matches!(err, Error::Remote(RemoteError::Status { status: 500, .. })));
    let remaining: Vec<CartItemId> = s
        .state
        .cart()
        .snapshot()
        .items()
        .iter()
        .map(|item| item.id.clone())
        .collect();
    assert_eq!(remaining, vec![CartItemId::new("c2"), CartItemId::new("c3")]);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let s = serve_with(user("u1"), Duration::from_millis(200)).await;
    s.backend.fail(Endpoint::Products, Fault::Timeout);

    let err = s.remote.products().await.expect_err("timeout");

    assert!(err.is_timeout(), "got {err:?}");
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let s = serve().await;
    s.backend.fail(Endpoint::Orders, Fault::Malformed);

    let err = s.remote.orders().await.expect_err("malformed");

    assert!(matches!(err, RemoteError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_connection_failure() {
    // Grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/")).expect("url");
    let remote = HttpRemoteStore::new(&ClientConfig::new(url)).expect("client");

    let err = remote.products().await.expect_err("refused");

    assert!(err.is_connection_failure(), "got {err:?}");
    assert_eq!(
        Error::from(err).user_message(),
        "Could not reach the server. Check your connection."
    );
}

#[tokio::test]
async fn test_orders_and_cancel_over_http() {
    let s = serve().await;
    s.backend.add_order(order(
        "o1",
        &s.user.id,
        Timestamp::Text("2024-03-01T10:00:00Z".to_string()),
        OrderStatus::Pending,
    ));
    s.backend
        .add_order(order("o2", &s.user.id, Timestamp::Epoch(1), OrderStatus::Shipped));

    let orders = s.state.orders().my_orders().await.expect("orders");
    assert_eq!(orders[0].id.as_str(), "o1");

    s.state.orders().cancel(&orders[0]).await.expect("cancel");
    assert_eq!(s.backend.orders_snapshot()[0].status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_checkout_over_http() {
    let s = serve().await;
    s.state
        .cart()
        .add(&product("p1", 1999), 3)
        .await
        .expect("add");

    let placed = s
        .state
        .checkout()
        .checkout("12 Rue des Fleurs, Rabat")
        .await
        .expect("checkout");

    assert_eq!(placed.total, rust_decimal::Decimal::new(5997, 2));
    assert!(s.state.cart().snapshot().is_empty());
    assert!(s.backend.cart_of(&s.user.id).is_empty());
}
