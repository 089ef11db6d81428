//! Order Submission Flow.
//!
//! Freezes the cart into an order, submits it, then empties the cart with
//! the engine's clear-with-fallback.

use std::sync::Arc;

use pocketshop_core::{NewOrder, Order, Timestamp};
use tracing::{info, instrument, warn};

use crate::cart::CartEngine;
use crate::error::{Error, Result, add_breadcrumb};
use crate::remote::RemoteStore;

/// Shortest accepted shipping address, in characters after trimming.
pub const MIN_ADDRESS_CHARS: usize = 10;

/// Validate a shipping address and return it trimmed.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a blank address or one shorter than
/// [`MIN_ADDRESS_CHARS`].
pub fn validate_shipping_address(raw: &str) -> Result<&str> {
    let address = raw.trim();
    if address.is_empty() {
        return Err(Error::Validation(
            "Shipping address is required".to_string(),
        ));
    }
    if address.chars().count() < MIN_ADDRESS_CHARS {
        return Err(Error::Validation(format!(
            "Shipping address must be at least {MIN_ADDRESS_CHARS} characters"
        )));
    }
    Ok(address)
}

/// Checkout for the current session's cart.
#[derive(Clone)]
pub struct Checkout {
    cart: CartEngine,
    remote: Arc<dyn RemoteStore>,
}

impl Checkout {
    #[must_use]
    pub fn new(cart: CartEngine, remote: Arc<dyn RemoteStore>) -> Self {
        Self { cart, remote }
    }

    /// Place an order for everything in the cart.
    ///
    /// Local preconditions (session, non-empty cart, address) are checked
    /// before any network call. Prices and the total come from the snapshot
    /// at call time.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAuthenticated`], [`Error::EmptyCart`],
    ///   [`Error::TotalOutOfRange`], [`Error::Validation`] without touching
    ///   the network
    /// - [`Error::Remote`] if the order is rejected; the cart is untouched
    /// - whatever [`CartEngine::clear`] raises if the order was placed but
    ///   the cart could not be emptied
    #[instrument(skip(self, shipping_address))]
    pub async fn checkout(&self, shipping_address: &str) -> Result<Order> {
        let user = self.cart.session_user().ok_or(Error::NotAuthenticated)?;
        let snapshot = self.cart.snapshot();
        if snapshot.is_empty() {
            return Err(Error::EmptyCart);
        }
        if snapshot.checked_total().is_none() {
            return Err(Error::TotalOutOfRange);
        }
        let address = validate_shipping_address(shipping_address)?;

        let order = NewOrder::from_cart(user.id.clone(), &snapshot, address, Timestamp::now());
        let confirmed = self.remote.create_order(&order).await?;

        info!(
            user_id = %user.id,
            order_id = %confirmed.id,
            total = %confirmed.total,
            "Order placed"
        );
        add_breadcrumb("checkout", "Order placed", &[("order_id", confirmed.id.as_str())]);

        if let Err(err) = self.cart.clear().await {
            warn!(order_id = %confirmed.id, error = %err, "Order placed but cart could not be cleared");
            return Err(err);
        }

        Ok(confirmed)
    }
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout").field("cart", &self.cart).finish_non_exhaustive()
    }
}
