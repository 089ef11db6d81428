//! Composition root shared by every front end.

use std::sync::Arc;

use crate::cart::CartEngine;
use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::favorites::Favorites;
use crate::orders::OrderService;
use crate::profile::Profile;
use crate::remote::{HttpRemoteStore, RemoteStore};
use crate::session::{FileSessionStore, SessionStore};
use crate::view::{CartViewModel, OrdersViewModel};

/// Application state wiring services to one Remote Store and one Session
/// Store.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
    cart: CartEngine,
    checkout: Checkout,
    orders: OrderService,
    catalog: Catalog,
    favorites: Favorites,
    profile: Profile,
}

impl AppState {
    /// Production wiring: HTTP Remote Store and file-backed session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file cannot be read.
    pub async fn from_config(config: ClientConfig) -> Result<Self> {
        let remote = Arc::new(HttpRemoteStore::new(&config)?);
        let session = Arc::new(FileSessionStore::open(config.session_file.clone()).await?);
        Ok(Self::new(config, remote, session))
    }

    /// Wire services over the given collaborators.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let cart = CartEngine::new(Arc::clone(&remote), Arc::clone(&session));
        let checkout = Checkout::new(cart.clone(), Arc::clone(&remote));
        let orders = OrderService::new(Arc::clone(&remote), Arc::clone(&session));
        let catalog = Catalog::new(Arc::clone(&remote), config.catalog_ttl);
        let favorites = Favorites::new(Arc::clone(&remote), Arc::clone(&session));
        let profile = Profile::new(remote, Arc::clone(&session), cart.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                cart,
                checkout,
                orders,
                catalog,
                favorites,
                profile,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &dyn SessionStore {
        self.inner.session.as_ref()
    }

    #[must_use]
    pub fn cart(&self) -> &CartEngine {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn favorites(&self) -> &Favorites {
        &self.inner.favorites
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.inner.profile
    }

    /// A cart view model over this state's engine.
    #[must_use]
    pub fn cart_view(&self) -> CartViewModel {
        CartViewModel::new(self.inner.cart.clone(), self.inner.checkout.clone())
    }

    #[must_use]
    pub fn orders_view(&self) -> OrdersViewModel {
        OrdersViewModel::new(self.inner.orders.clone())
    }

    /// Log out and drop the local cart. Same as [`Profile::logout`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be cleared.
    pub async fn logout(&self) -> Result<()> {
        self.inner.profile.logout().await
    }
}
