//! Order history: listing, cancellation and reorder.

use std::cmp::Reverse;
use std::sync::Arc;

use pocketshop_core::{Order, OrderId, User, UserId};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::remote::{RemoteError, RemoteStore};
use crate::session::SessionStore;

/// Order history for the logged-in user.
#[derive(Clone)]
pub struct OrderService {
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionStore>,
}

impl OrderService {
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

    /// Orders for the session user, newest first.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, otherwise as
    /// [`OrderService::list_for_user`].
    pub async fn my_orders(&self) -> Result<Vec<Order>> {
        let user = self.require_user()?;
        self.list_for_user(&user.id).await
    }

    /// Orders for `user_id`, newest first.
    ///
    /// Uses the per-user endpoint; if that fails for any reason, fetches
    /// every order and filters locally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the fallback listing fails too.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let mut orders = match self.remote.user_orders(user_id).await {
            Ok(orders) => orders,
            Err(err) => {
                warn!(error = %err, "Per-user order listing failed, filtering all orders");
                self.remote
                    .orders()
                    .await?
                    .into_iter()
                    .filter(|order| &order.user_id == user_id)
                    .collect()
            }
        };
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// - [`Error::OrderNotCancellable`] if the order is not pending (no
    ///   network call), the server reports failure, or answers 400
    /// - [`Error::OrderNotFound`] on 404, [`Error::Forbidden`] on 403,
    ///   [`Error::NotAuthenticated`] on 401 or without a session
    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn cancel(&self, order: &Order) -> Result<()> {
        self.require_user()?;
        if !order.status.is_cancellable() {
            return Err(Error::OrderNotCancellable(order.id.clone()));
        }

        let response = self
            .remote
            .cancel_order(&order.id)
            .await
            .map_err(|err| match err.status() {
                Some(404) => Error::OrderNotFound(order.id.clone()),
                Some(400) => Error::OrderNotCancellable(order.id.clone()),
                Some(403) => Error::Forbidden,
                Some(401) => Error::NotAuthenticated,
                _ => Error::Remote(err),
            })?;

        if !response.success {
            warn!(message = ?response.message, "Server declined cancellation");
            return Err(Error::OrderNotCancellable(order.id.clone()));
        }

        info!("Order cancelled");
        Ok(())
    }

    /// Place a new order with the same lines as `order_id`.
    ///
    /// # Errors
    ///
    /// [`Error::OrderNotFound`] on 404, [`Error::Conflict`] on 400/409
    /// (items no longer available), [`Error::Remote`] otherwise.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn reorder(&self, order_id: &OrderId) -> Result<Order> {
        self.require_user()?;
        let order = self
            .remote
            .reorder(order_id)
            .await
            .map_err(|err| match err {
                RemoteError::Status { status: 404, .. } => Error::OrderNotFound(order_id.clone()),
                RemoteError::Status {
                    status: 400 | 409,
                    message,
                } => Error::Conflict(message),
                other => Error::Remote(other),
            })?;
        info!(new_order_id = %order.id, "Reordered");
        Ok(order)
    }
}

/// Sort by creation date descending. Unparsable dates sort last; ties keep
/// server order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by_key(|order| Reverse(order.date.sort_key()));
}
