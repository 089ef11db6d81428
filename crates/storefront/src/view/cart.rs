use std::sync::Arc;

use pocketshop_core::{CartItem, CartItemId, CartSnapshot, Order, Product};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cart::CartEngine;
use crate::checkout::Checkout;
use crate::error::Error;
use crate::session::SessionStore;

/// What the cart screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartViewState {
    Loading,
    NotAuthenticated,
    Empty,
    Loaded {
        items: Vec<CartItem>,
        total: Decimal,
        item_count: u64,
    },
    /// Terminal for one checkout; the next `Load` returns to `Empty` or
    /// `Loaded`.
    CheckoutSucceeded { order: Order },
    Error { message: String },
}

impl CartViewState {
    /// Project a settled snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        if snapshot.is_empty() {
            Self::Empty
        } else {
            Self::Loaded {
                items: snapshot.items().to_vec(),
                total: snapshot.total(),
                item_count: snapshot.item_count(),
            }
        }
    }

    /// Project a failed operation. Raw error text never reaches the view.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::NotAuthenticated => Self::NotAuthenticated,
            other => Self::Error {
                message: other.user_message(),
            },
        }
    }
}

/// User actions on the cart screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIntent {
    Load,
    Add { product: Product, quantity: u32 },
    UpdateQuantity { item_id: CartItemId, quantity: i64 },
    Remove { item_id: CartItemId },
    Clear,
    /// Without an address the session user's profile address is used.
    Checkout { shipping_address: Option<String> },
}

/// Turns cart intents into [`CartViewState`]s.
#[derive(Clone)]
pub struct CartViewModel {
    cart: CartEngine,
    checkout: Checkout,
    state: Arc<watch::Sender<CartViewState>>,
}

impl CartViewModel {
    #[must_use]
    pub fn new(cart: CartEngine, checkout: Checkout) -> Self {
        let initial = if cart.session_user().is_some() {
            CartViewState::from_snapshot(&cart.snapshot())
        } else {
            CartViewState::NotAuthenticated
        };
        let (state, _rx) = watch::channel(initial);
        Self {
            cart,
            checkout,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn state(&self) -> CartViewState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartViewState> {
        self.state.subscribe()
    }

    fn publish(&self, state: CartViewState) -> CartViewState {
        self.state.send_replace(state.clone());
        state
    }

    /// Run an intent to completion and return the state it settled on.
    pub async fn dispatch(&self, intent: CartIntent) -> CartViewState {
        debug!(?intent, "Cart intent");
        let outcome = match intent {
            CartIntent::Load => {
                self.publish(CartViewState::Loading);
                if self.cart.session_user().is_none() {
                    self.cart.reset();
                    return self.publish(CartViewState::NotAuthenticated);
                }
                self.cart.load().await
            }
            CartIntent::Add { product, quantity } => {
                self.cart.add(&product, quantity).await.map(|_| ())
            }
            CartIntent::UpdateQuantity { item_id, quantity } => {
                self.cart.update_quantity(&item_id, quantity).await
            }
            CartIntent::Remove { item_id } => self.cart.remove(&item_id).await,
            CartIntent::Clear => self.cart.clear().await,
            CartIntent::Checkout { shipping_address } => {
                let address = shipping_address
                    .or_else(|| self.cart.session_user().map(|user| user.address))
                    .unwrap_or_default();
                return match self.checkout.checkout(&address).await {
                    Ok(order) => self.publish(CartViewState::CheckoutSucceeded { order }),
                    Err(err) => self.fail(&err),
                };
            }
        };

        match outcome {
            // An anonymous clear succeeds locally but there is still no cart
            Ok(()) if self.cart.session_user().is_none() => {
                self.publish(CartViewState::NotAuthenticated)
            }
            Ok(()) => self.publish(CartViewState::from_snapshot(&self.cart.snapshot())),
            Err(err) => self.fail(&err),
        }
    }

    fn fail(&self, err: &Error) -> CartViewState {
        err.report();
        self.publish(CartViewState::from_error(err))
    }

    /// Follow session changes: reload when a user logs in, reset to
    /// `NotAuthenticated` on logout. Runs until the session store is dropped.
    pub fn follow_session(&self, session: &dyn SessionStore) -> JoinHandle<()> {
        let mut rx = session.subscribe();
        let view = self.clone();
        tokio::spawn(async move {
            let mut was_active = rx.borrow_and_update().is_active();
            while rx.changed().await.is_ok() {
                let active = rx.borrow_and_update().is_active();
                if active {
                    view.dispatch(CartIntent::Load).await;
                } else if was_active {
                    view.cart.reset();
                    view.publish(CartViewState::NotAuthenticated);
                }
                was_active = active;
            }
        })
    }
}

impl std::fmt::Debug for CartViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartViewModel")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
