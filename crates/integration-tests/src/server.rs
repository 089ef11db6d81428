//! REST server over a [`Backend`], for exercising [`HttpRemoteStore`] end to
//! end.
//!
//! [`HttpRemoteStore`]: pocketshop_storefront::HttpRemoteStore

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use pocketshop_core::{
    CartItem, CartItemId, FavoriteId, NewCartItem, NewFavorite, NewOrder, OrderId, ProductId,
    RegisterRequest, UserId,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use url::Url;

use crate::backend::{Backend, Fault};

/// How long a `Fault::Timeout` response stalls.
const STALL: Duration = Duration::from_secs(10);

type Shared = State<Arc<Backend>>;

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: String,
}

async fn fault_response(fault: Fault) -> Response {
    match fault {
        Fault::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "injected failure").into_response()
        }
        // Closest an HTTP handler can get to a dropped connection
        Fault::Disconnect => StatusCode::BAD_GATEWAY.into_response(),
        Fault::Timeout => {
            tokio::time::sleep(STALL).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        Fault::Malformed => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"id\":",
        )
            .into_response(),
    }
}

async fn json<T: Serialize>(result: Result<T, Fault>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(fault) => fault_response(fault).await,
    }
}

async fn empty(result: Result<(), Fault>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(fault) => fault_response(fault).await,
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(backend): Shared) -> Response {
    json(backend.products()).await
}

async fn get_product(State(backend): Shared, Path(id): Path<String>) -> Response {
    json(backend.product(&ProductId::new(id))).await
}

async fn list_users(State(backend): Shared) -> Response {
    json(backend.users()).await
}

async fn create_user(State(backend): Shared, Json(request): Json<RegisterRequest>) -> Response {
    json(backend.create_user(&request)).await
}

async fn list_favorites(State(backend): Shared, Query(q): Query<UserQuery>) -> Response {
    json(backend.favorites(&UserId::new(q.user_id))).await
}

async fn add_favorite(State(backend): Shared, Json(favorite): Json<NewFavorite>) -> Response {
    json(backend.add_favorite(&favorite)).await
}

async fn delete_favorite(State(backend): Shared, Path(id): Path<String>) -> Response {
    empty(backend.delete_favorite(&FavoriteId::new(id))).await
}

async fn list_cart(State(backend): Shared, Query(q): Query<UserQuery>) -> Response {
    json(backend.cart(&UserId::new(q.user_id))).await
}

async fn create_cart_item(State(backend): Shared, Json(item): Json<NewCartItem>) -> Response {
    json(backend.create_cart_item(&item)).await
}

async fn clear_cart(State(backend): Shared, Query(q): Query<UserQuery>) -> Response {
    empty(backend.clear_cart(&UserId::new(q.user_id))).await
}

async fn update_cart_item(
    State(backend): Shared,
    Path(id): Path<String>,
    Json(item): Json<CartItem>,
) -> Response {
    let item = CartItem {
        id: CartItemId::new(id),
        ..item
    };
    json(backend.update_cart_item(&item)).await
}

async fn delete_cart_item(State(backend): Shared, Path(id): Path<String>) -> Response {
    empty(backend.delete_cart_item(&CartItemId::new(id))).await
}

async fn list_orders(State(backend): Shared) -> Response {
    json(backend.orders()).await
}

async fn create_order(State(backend): Shared, Json(order): Json<NewOrder>) -> Response {
    json(backend.create_order(&order)).await
}

async fn user_orders(State(backend): Shared, Path(user_id): Path<String>) -> Response {
    json(backend.user_orders(&UserId::new(user_id))).await
}

async fn cancel_order(State(backend): Shared, Path(id): Path<String>) -> Response {
    json(backend.cancel_order(&OrderId::new(id))).await
}

async fn reorder(State(backend): Shared, Path(id): Path<String>) -> Response {
    json(backend.reorder(&OrderId::new(id))).await
}

/// Routes matching the Remote Store's REST layout.
pub fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/users", get(list_users).post(create_user))
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/{id}", axum::routing::delete(delete_favorite))
        .route(
            "/cart",
            get(list_cart).post(create_cart_item).delete(clear_cart),
        )
        .route("/cart/{id}", put(update_cart_item).delete(delete_cart_item))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/user/{user_id}", get(user_orders))
        .route("/orders/{id}/cancel", put(cancel_order))
        .route("/orders/{id}/reorder", post(reorder))
        .with_state(backend)
}

/// Serve `backend` on an ephemeral localhost port and return its base URL.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn spawn(backend: Arc<Backend>) -> std::io::Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)
}
