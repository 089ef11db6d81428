//! Product catalog with an in-memory `moka` cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pocketshop_core::{Product, ProductId};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::remote::RemoteStore;

/// Cache key for catalog entries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Read-only product catalog.
///
/// Listings and single products are cached for the configured TTL. A zero
/// TTL disables caching.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    remote: Arc<dyn RemoteStore>,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl Catalog {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build()
        });
        Self {
            inner: Arc::new(CatalogInner { remote, cache }),
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// Every product, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Remote`] if the listing fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let products = self.inner.remote.products().await?;
        for product in &products {
            self.store(
                CacheKey::Product(product.id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;
        }
        self.store(CacheKey::Products, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Remote`] if the fetch fails (404 included).
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.inner.remote.product(id).await?;
        self.store(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Products whose name or category contains `query`, ignoring case.
    /// A blank query returns everything.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::products`].
    pub async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let products = self.products().await?;
        Ok(products
            .into_iter()
            .filter(|product| product.matches(query))
            .collect())
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}
