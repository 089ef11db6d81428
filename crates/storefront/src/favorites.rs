//! Favorite products for the logged-in user.

use std::sync::Arc;

use pocketshop_core::{Favorite, FavoriteId, NewFavorite, ProductId, User};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::remote::RemoteStore;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct Favorites {
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionStore>,
}

impl Favorites {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<dyn SessionStore>) -> Self {
        Self { remote, session }
    }

    fn require_user(&self) -> Result<User> {
        self.session
            .current()
            .active_user()
            .cloned()
            .ok_or(Error::NotAuthenticated)
    }

    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, [`Error::Remote`] if
    /// the listing fails.
    pub async fn list(&self) -> Result<Vec<Favorite>> {
        let user = self.require_user()?;
        Ok(self.remote.favorites(&user.id).await?)
    }

    /// Mark a product as favorite. Already-favorite products are returned
    /// as they are, without a write.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, [`Error::Remote`] on
    /// failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<Favorite> {
        let user = self.require_user()?;
        let existing = self.remote.favorites(&user.id).await?;
        if let Some(favorite) = existing.into_iter().find(|f| &f.product_id == product_id) {
            debug!(favorite_id = %favorite.id, "Already a favorite");
            return Ok(favorite);
        }

        let favorite = NewFavorite {
            user_id: user.id,
            product_id: product_id.clone(),
        };
        Ok(self.remote.add_favorite(&favorite).await?)
    }

    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, [`Error::Remote`] on
    /// failure.
    #[instrument(skip(self), fields(favorite_id = %favorite_id))]
    pub async fn remove(&self, favorite_id: &FavoriteId) -> Result<()> {
        self.require_user()?;
        Ok(self.remote.delete_favorite(favorite_id).await?)
    }
}
