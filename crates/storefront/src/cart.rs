//! Cart Synchronization Engine.
//!
//! Keeps a local [`CartSnapshot`] in step with the Remote Store. Every
//! mutation is confirm-then-apply: the snapshot changes only after the
//! server accepted the call, and always to the server's representation.
//!
//! # Ordering
//!
//! Each operation takes a ticket when it is issued. Mutations always apply
//! their confirmed result. A load applies only if nothing issued after it
//! has applied already, so a slow load can never overwrite a newer state.
//! The check and the write happen under the snapshot channel's write lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pocketshop_core::{CartItem, CartItemId, CartSnapshot, NewCartItem, Product, User, UserId};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::remote::{RemoteError, RemoteStore};
use crate::session::SessionStore;

/// Client-side cart for the current session.
///
/// Cheap to clone; clones share the snapshot.
#[derive(Clone)]
pub struct CartEngine {
    inner: Arc<CartEngineInner>,
}

struct CartEngineInner {
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionStore>,
    snapshot: watch::Sender<CartSnapshot>,
    /// Last ticket handed out.
    issued: AtomicU64,
    /// Highest ticket whose result reached the snapshot.
    applied: AtomicU64,
}

impl CartEngine {
    /// Create an engine with an empty snapshot.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<dyn SessionStore>) -> Self {
        let (snapshot, _rx) = watch::channel(CartSnapshot::empty());
        Self {
            inner: Arc::new(CartEngineInner {
                remote,
                session,
                snapshot,
                issued: AtomicU64::new(0),
                applied: AtomicU64::new(0),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current settled snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that observes every settled snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshot.subscribe()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.inner.snapshot.borrow().total()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.snapshot.borrow().item_count()
    }

    /// The logged-in user, read fresh from the Session Store.
    #[must_use]
    pub fn session_user(&self) -> Option<User> {
        self.inner.session.current().active_user().cloned()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the snapshot with the server's cart.
    ///
    /// Without an active session the snapshot is emptied and no call is
    /// made. A load superseded by a later operation is discarded.
    ///
    /// # Errors
    ///
    /// [`Error::Remote`] if the fetch fails, [`Error::TotalOutOfRange`] if
    /// the server's lines cannot be totalled. The snapshot is kept either way.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<()> {
        let ticket = self.issue();
        let Some(user) = self.session_user() else {
            debug!("No active session, cart is empty");
            self.apply_load(ticket, CartSnapshot::empty());
            return Ok(());
        };

        let items = self.inner.remote.cart(&user.id).await?;
        let snapshot = CartSnapshot::new(items);
        if snapshot.checked_total().is_none() {
            warn!(user_id = %user.id, "Server cart total overflows, keeping previous snapshot");
            return Err(Error::TotalOutOfRange);
        }
        let count = snapshot.len();
        if self.apply_load(ticket, snapshot) {
            debug!(user_id = %user.id, lines = count, "Cart loaded");
        } else {
            debug!(user_id = %user.id, ticket, "Discarding superseded cart load");
        }
        Ok(())
    }

    /// Add `quantity` units of `product`.
    ///
    /// If the cart already holds the product, the existing line is updated
    /// to the combined quantity instead of creating a second line.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, [`Error::Validation`]
    /// for a zero quantity, [`Error::TotalOutOfRange`] if the cart total
    /// would overflow (all without a network call), [`Error::Remote`] if the
    /// server rejects the call.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<CartItem> {
        let ticket = self.issue();
        let user = self.require_user()?;
        if quantity == 0 {
            return Err(Error::Validation("Quantity must be at least 1".to_string()));
        }

        let existing = self.inner.snapshot.borrow().find_product(&product.id).cloned();
        let target = match &existing {
            Some(item) => item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| Error::Validation("Quantity is too large".to_string()))?,
            None => quantity,
        };
        self.check_total_with(product, target)?;

        let confirmed = match existing {
            Some(item) => {
                self.inner
                    .remote
                    .update_cart_item(&item.with_quantity(target))
                    .await?
            }
            None => {
                let item = NewCartItem::new(user.id.clone(), product.clone(), quantity);
                self.inner.remote.create_cart_item(&item).await?
            }
        };

        info!(user_id = %user.id, item_id = %confirmed.id, quantity = confirmed.quantity, "Added to cart");
        self.apply(ticket, |snapshot| snapshot.upsert(confirmed.clone()));
        Ok(confirmed)
    }

    /// Set the quantity of a cart line. Zero or negative removes the line.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session,
    /// [`Error::UnknownCartItem`] if the line is not in the local cart,
    /// [`Error::TotalOutOfRange`] if the cart total would overflow (all
    /// without a network call), [`Error::Remote`] if the server rejects the
    /// call.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_quantity(&self, item_id: &CartItemId, quantity: i64) -> Result<()> {
        self.require_user()?;
        let item = self
            .inner
            .snapshot
            .borrow()
            .get(item_id)
            .cloned()
            .ok_or_else(|| Error::UnknownCartItem(item_id.clone()))?;
        if quantity <= 0 {
            return self.remove(item_id).await;
        }

        let ticket = self.issue();
        let quantity = u32::try_from(quantity)
            .map_err(|_| Error::Validation("Quantity is too large".to_string()))?;
        self.check_total_with(&item.product, quantity)?;

        let confirmed = self
            .inner
            .remote
            .update_cart_item(&item.with_quantity(quantity))
            .await?;
        debug!(quantity = confirmed.quantity, "Quantity updated");
        self.apply(ticket, |snapshot| snapshot.upsert(confirmed));
        Ok(())
    }

    /// Delete a cart line.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] without a session, [`Error::Remote`] if
    /// the delete fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&self, item_id: &CartItemId) -> Result<()> {
        let ticket = self.issue();
        self.require_user()?;
        self.inner.remote.delete_cart_item(item_id).await?;
        debug!("Cart item removed");
        self.apply(ticket, |snapshot| {
            snapshot.remove(item_id);
        });
        Ok(())
    }

    /// Empty the cart.
    ///
    /// Tries the bulk endpoint first. If the server answers with any error
    /// status or the connection fails, falls back to deleting every line the
    /// server lists for the user, including lines this client never saw.
    /// If one of those deletes fails the cart is reloaded from the server
    /// and installed before the error is returned, so the snapshot never
    /// silently diverges.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] if the fallback cannot list the server cart; the
    ///   snapshot is untouched and nothing was deleted
    /// - [`Error::Remote`] with the failed delete's error after a resync
    /// - [`Error::InconsistentState`] if the resync fails as well
    /// - [`Error::Remote`] for timeouts and malformed responses, unchanged
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let ticket = self.issue();
        let Some(user) = self.session_user() else {
            self.apply(ticket, CartSnapshot::clear);
            return Ok(());
        };

        match self.inner.remote.clear_cart(&user.id).await {
            Ok(()) => {
                info!(user_id = %user.id, "Cart cleared");
                self.apply(ticket, CartSnapshot::clear);
                Ok(())
            }
            Err(err) if err.status().is_some() || err.is_connection_failure() => {
                warn!(user_id = %user.id, error = %err, "Bulk clear unavailable, deleting items individually");
                self.clear_item_by_item(ticket, &user.id).await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Drop the local snapshot without touching the server (logout).
    ///
    /// Any load still in flight is discarded when it completes.
    pub fn reset(&self) {
        let ticket = self.issue();
        self.apply(ticket, CartSnapshot::clear);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn issue(&self) -> u64 {
        self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn require_user(&self) -> Result<User> {
        self.session_user().ok_or(Error::NotAuthenticated)
    }

    /// Reject a change that would leave the cart total unrepresentable.
    fn check_total_with(&self, product: &Product, quantity: u32) -> Result<()> {
        self.inner
            .snapshot
            .borrow()
            .checked_total_with(product, quantity)
            .map(|_| ())
            .ok_or(Error::TotalOutOfRange)
    }

    /// Apply a confirmed mutation unconditionally.
    fn apply(&self, ticket: u64, mutate: impl FnOnce(&mut CartSnapshot)) {
        self.inner.snapshot.send_modify(|snapshot| {
            mutate(snapshot);
            self.inner.applied.fetch_max(ticket, Ordering::SeqCst);
        });
    }

    /// Install a loaded snapshot unless a later operation already applied.
    /// Returns whether the snapshot was installed.
    fn apply_load(&self, ticket: u64, loaded: CartSnapshot) -> bool {
        self.inner.snapshot.send_if_modified(|snapshot| {
            if ticket < self.inner.applied.load(Ordering::SeqCst) {
                return false;
            }
            *snapshot = loaded;
            self.inner.applied.fetch_max(ticket, Ordering::SeqCst);
            true
        })
    }

    async fn clear_item_by_item(&self, ticket: u64, user_id: &UserId) -> Result<()> {
        // The server's listing, not the snapshot: lines from a timed-out add
        // or a clear before the first load exist only remotely.
        let ids: Vec<CartItemId> = self
            .inner
            .remote
            .cart(user_id)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();

        for id in ids {
            if let Err(err) = self.inner.remote.delete_cart_item(&id).await {
                warn!(item_id = %id, error = %err, "Item delete failed during clear, resynchronizing");
                return Err(self.resync(user_id, err).await);
            }
            self.apply(ticket, |snapshot| {
                snapshot.remove(&id);
            });
        }

        info!(user_id = %user_id, "Cart cleared item by item");
        self.apply(ticket, CartSnapshot::clear);
        Ok(())
    }

    /// Reload after a partial clear and install the result unconditionally.
    /// Returns the error the caller should raise.
    async fn resync(&self, user_id: &UserId, cause: RemoteError) -> Error {
        let ticket = self.issue();
        match self.inner.remote.cart(user_id).await {
            Ok(items) => {
                let snapshot = CartSnapshot::new(items);
                self.apply(ticket, |current| *current = snapshot);
                Error::Remote(cause)
            }
            Err(resync) => {
                tracing::error!(
                    user_id = %user_id,
                    cause = %cause,
                    resync = %resync,
                    "Cart resync failed, local snapshot may be stale"
                );
                Error::InconsistentState {
                    cause: Box::new(cause),
                    resync: Box::new(resync),
                }
            }
        }
    }
}

impl std::fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("snapshot", &*self.inner.snapshot.borrow())
            .field("issued", &self.inner.issued.load(Ordering::Relaxed))
            .field("applied", &self.inner.applied.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
