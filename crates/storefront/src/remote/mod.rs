//! Remote Store access.
//!
//! # Architecture
//!
//! - [`RemoteStore`] is the seam every service talks through; it mirrors the
//!   backend's REST resources one method per endpoint
//! - [`HttpRemoteStore`] is the production implementation (`reqwest`, JSON,
//!   explicit request timeout)
//! - The backend is the source of truth: nothing here caches or retries
//!
//! # Endpoints
//!
//! | Method | Endpoint |
//! |---|---|
//! | [`products`](RemoteStore::products) | `GET products` |
//! | [`product`](RemoteStore::product) | `GET products/{id}` |
//! | [`users`](RemoteStore::users) | `GET users` |
//! | [`create_user`](RemoteStore::create_user) | `POST users` |
//! | [`favorites`](RemoteStore::favorites) | `GET favorites?userId` |
//! | [`add_favorite`](RemoteStore::add_favorite) | `POST favorites` |
//! | [`delete_favorite`](RemoteStore::delete_favorite) | `DELETE favorites/{id}` |
//! | [`cart`](RemoteStore::cart) | `GET cart?userId` |
//! | [`create_cart_item`](RemoteStore::create_cart_item) | `POST cart` |
//! | [`update_cart_item`](RemoteStore::update_cart_item) | `PUT cart/{id}` |
//! | [`delete_cart_item`](RemoteStore::delete_cart_item) | `DELETE cart/{id}` |
//! | [`clear_cart`](RemoteStore::clear_cart) | `DELETE cart?userId` |
//! | [`create_order`](RemoteStore::create_order) | `POST orders` |
//! | [`user_orders`](RemoteStore::user_orders) | `GET orders/user/{userId}` |
//! | [`orders`](RemoteStore::orders) | `GET orders` |
//! | [`cancel_order`](RemoteStore::cancel_order) | `PUT orders/{id}/cancel` |
//! | [`reorder`](RemoteStore::reorder) | `POST orders/{id}/reorder` |

mod http;

pub use http::HttpRemoteStore;

use async_trait::async_trait;
use pocketshop_core::{
    ApiResponse, CartItem, CartItemId, Favorite, FavoriteId, NewCartItem, NewFavorite, NewOrder,
    Order, OrderId, Product, ProductId, RegisterRequest, User, UserId,
};
use thiserror::Error;

/// Errors that can occur when talking to the Remote Store.
///
/// Callers decide on fallbacks with [`RemoteError::status`] and
/// [`RemoteError::is_connection_failure`], never by inspecting messages.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established or was dropped.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A body was required but the server sent none.
    #[error("Empty response body")]
    EmptyBody,

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A default header (e.g. the bearer token) is not a valid header value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl RemoteError {
    /// HTTP status code, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connect(_))
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Build a status error from a response code and body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: body.chars().take(200).collect(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_request() {
            // Dropped mid-request (reset, closed before headers)
            Self::Connect(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// The REST backend holding products, users, carts, orders and favorites.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn products(&self) -> Result<Vec<Product>, RemoteError>;

    async fn product(&self, id: &ProductId) -> Result<Product, RemoteError>;

    async fn users(&self) -> Result<Vec<User>, RemoteError>;

    async fn create_user(&self, request: &RegisterRequest) -> Result<User, RemoteError>;

    async fn favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>, RemoteError>;

    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<Favorite, RemoteError>;

    async fn delete_favorite(&self, id: &FavoriteId) -> Result<(), RemoteError>;

    /// All cart items belonging to `user_id`.
    async fn cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, RemoteError>;

    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RemoteError>;

    /// Replace a cart item; the server's representation is returned.
    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem, RemoteError>;

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), RemoteError>;

    /// Bulk delete of every cart item for `user_id`. Not every backend
    /// supports this; callers fall back to per-item deletion.
    async fn clear_cart(&self, user_id: &UserId) -> Result<(), RemoteError>;

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RemoteError>;

    async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, RemoteError>;

    /// Every order in the store, across users.
    async fn orders(&self) -> Result<Vec<Order>, RemoteError>;

    async fn cancel_order(&self, id: &OrderId) -> Result<ApiResponse, RemoteError>;

    async fn reorder(&self, id: &OrderId) -> Result<Order, RemoteError>;
}
