//! HTTP implementation of [`RemoteStore`].
//!
//! Plain JSON over `reqwest`. Every request carries the configured timeout
//! and, when set, a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use pocketshop_core::{
    ApiResponse, CartItem, CartItemId, Favorite, FavoriteId, NewCartItem, NewFavorite, NewOrder,
    Order, OrderId, Product, ProductId, RegisterRequest, User, UserId,
};
use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{RemoteError, RemoteStore};
use crate::config::ClientConfig;

/// Number of body characters kept in logs.
const LOG_BODY_CHARS: usize = 500;

/// `reqwest`-backed Remote Store client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpRemoteStore {
    inner: Arc<HttpRemoteStoreInner>,
}

struct HttpRemoteStoreInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemoteStore {
    /// Create a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the API token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| RemoteError::InvalidHeader(format!("API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpRemoteStoreInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build `base/segment/segment/...`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build `base/segment?userId=...`.
    fn endpoint_for_user(&self, segment: &str, user_id: &UserId) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(&[segment])?;
        url.query_pairs_mut().append_pair("userId", user_id.as_str());
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Remote Store returned non-success status"
            );
            return Err(RemoteError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }

    /// Send a request and decode its JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Err(RemoteError::EmptyBody);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Failed to parse Remote Store response"
            );
            RemoteError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn execute(&self, request: RequestBuilder) -> Result<(), RemoteError> {
        self.send(request).await.map(|_| ())
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.inner.client.get(url)
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.inner.client.post(url)
    }

    fn put(&self, url: Url) -> RequestBuilder {
        self.inner.client.put(url)
    }

    fn delete(&self, url: Url) -> RequestBuilder {
        self.inner.client.delete(url)
    }
}

impl std::fmt::Debug for HttpRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteStore")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    // =========================================================================
    // Catalog and users
    // =========================================================================

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, RemoteError> {
        let url = self.endpoint(&["products"])?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, RemoteError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self))]
    async fn users(&self) -> Result<Vec<User>, RemoteError> {
        let url = self.endpoint(&["users"])?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, RemoteError> {
        let url = self.endpoint(&["users"])?;
        self.fetch(self.post(url).json(request)).await
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>, RemoteError> {
        let url = self.endpoint_for_user("favorites", user_id)?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self, favorite), fields(user_id = %favorite.user_id, product_id = %favorite.product_id))]
    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<Favorite, RemoteError> {
        let url = self.endpoint(&["favorites"])?;
        self.fetch(self.post(url).json(favorite)).await
    }

    #[instrument(skip(self), fields(favorite_id = %id))]
    async fn delete_favorite(&self, id: &FavoriteId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["favorites", id.as_str()])?;
        self.execute(self.delete(url)).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, RemoteError> {
        let url = self.endpoint_for_user("cart", user_id)?;
        let items: Vec<CartItem> = self.fetch(self.get(url)).await?;
        debug!(count = items.len(), "Fetched cart");
        Ok(items)
    }

    #[instrument(skip(self, item), fields(user_id = %item.user_id, product_id = %item.product.id))]
    async fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RemoteError> {
        let url = self.endpoint(&["cart"])?;
        self.fetch(self.post(url).json(item)).await
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, quantity = item.quantity))]
    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem, RemoteError> {
        let url = self.endpoint(&["cart", item.id.as_str()])?;
        self.fetch(self.put(url).json(item)).await
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["cart", id.as_str()])?;
        self.execute(self.delete(url)).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn clear_cart(&self, user_id: &UserId) -> Result<(), RemoteError> {
        let url = self.endpoint_for_user("cart", user_id)?;
        self.execute(self.delete(url)).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    #[instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.products.len()))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, RemoteError> {
        let url = self.endpoint(&["orders"])?;
        self.fetch(self.post(url).json(order)).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, RemoteError> {
        let url = self.endpoint(&["orders", "user", user_id.as_str()])?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self))]
    async fn orders(&self) -> Result<Vec<Order>, RemoteError> {
        let url = self.endpoint(&["orders"])?;
        self.fetch(self.get(url)).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn cancel_order(&self, id: &OrderId) -> Result<ApiResponse, RemoteError> {
        let url = self.endpoint(&["orders", id.as_str(), "cancel"])?;
        self.fetch(self.put(url)).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn reorder(&self, id: &OrderId) -> Result<Order, RemoteError> {
        let url = self.endpoint(&["orders", id.as_str(), "reorder"])?;
        self.fetch(self.post(url)).await
    }
}
