//! In-process [`RemoteStore`] over a [`Backend`].

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use pocketshop_core::{
    ApiResponse, CartItem, CartItemId, Favorite, FavoriteId, NewCartItem, NewFavorite, NewOrder,
    Order, OrderId, Product, ProductId, RegisterRequest, User, UserId,
};
use pocketshop_storefront::{RemoteError, RemoteStore};
use tokio::sync::oneshot;

use crate::backend::{Backend, Fault};

/// Translate an injected fault into the error the HTTP client would raise.
#[must_use]
pub fn remote_error(fault: Fault) -> RemoteError {
    match fault {
        Fault::Status(status) => RemoteError::from_status(status, "injected failure"),
        Fault::Disconnect => RemoteError::Connect("connection reset by peer".to_string()),
        Fault::Timeout => RemoteError::Timeout,
        Fault::Malformed => match serde_json::from_str::<serde_json::Value>("{\"id\":") {
            Err(err) => RemoteError::Parse(err),
            Ok(_) => RemoteError::EmptyBody,
        },
    }
}

/// Handles for a cart load held at the fake.
///
/// `reached` fires once the load has read the backend; the load returns
/// that data only after `release` is sent (or dropped).
#[derive(Debug)]
pub struct CartGate {
    pub reached: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct PendingGate {
    reached: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Remote Store double that answers from a shared [`Backend`].
#[derive(Clone)]
pub struct FakeRemoteStore {
    backend: Arc<Backend>,
    cart_gate: Arc<Mutex<Option<PendingGate>>>,
}

impl FakeRemoteStore {
    #[must_use]
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            cart_gate: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Hold the next `cart` call after it has read the backend.
    #[must_use]
    pub fn gate_next_cart_load(&self) -> CartGate {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self
            .cart_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(PendingGate {
            reached: reached_tx,
            release: release_rx,
        });
        CartGate {
            reached: reached_rx,
            release: release_tx,
        }
    }

    fn take_gate(&self) -> Option<PendingGate> {
        self.cart_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl std::fmt::Debug for FakeRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeRemoteStore")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStore for FakeRemoteStore {
    async fn products(&self) -> Result<Vec<Product>, RemoteError> {
        self.backend.products().map_err(remote_error)
    }

    async fn product(&self, id: &ProductId) -> Result<Product, RemoteError> {
        self.backend.product(id).map_err(remote_error)
    }

    async fn users(&self) -> Result<Vec<User>, RemoteError> {
        self.backend.users().map_err(remote_error)
    }

    async fn create_user(&self, request: &RegisterRequest) -> Result<User, RemoteError> {
        self.backend.create_user(request).map_err(remote_error)
    }

    async fn favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>, RemoteError> {
        self.backend.favorites(user_id).map_err(remote_error)
    }

    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<Favorite, RemoteError> {
        self.backend.add_favorite(favorite).map_err(remote_error)
    }

    async fn delete_favorite(&self, id: &FavoriteId) -> Result<(), RemoteError> {
        self.backend.delete_favorite(id).map_err(remote_error)
    }

    async fn cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, RemoteError> {
        let result = self.backend.cart(user_id);
        if let Some(gate) = self.take_gate() {
            let _ = gate.reached.send(());
            let _ = gate.release.await;
        }
        result.map_err(remote_error)
    }

    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RemoteError> {
        self.backend.create_cart_item(item).map_err(remote_error)
    }

    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem, RemoteError> {
        self.backend.update_cart_item(item).map_err(remote_error)
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), RemoteError> {
        self.backend.delete_cart_item(id).map_err(remote_error)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<(), RemoteError> {
        self.backend.clear_cart(user_id).map_err(remote_error)
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RemoteError> {
        self.backend.create_order(order).map_err(remote_error)
    }

    async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, RemoteError> {
        self.backend.user_orders(user_id).map_err(remote_error)
    }

    async fn orders(&self) -> Result<Vec<Order>, RemoteError> {
        self.backend.orders().map_err(remote_error)
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<ApiResponse, RemoteError> {
        self.backend.cancel_order(id).map_err(remote_error)
    }

    async fn reorder(&self, id: &OrderId) -> Result<Order, RemoteError> {
        self.backend.reorder(id).map_err(remote_error)
    }
}
