//! View-State Projectors.
//!
//! Presentation code dispatches intents and renders the resulting states.
//! States are published on `tokio::sync::watch` channels; only settled
//! values are ever visible.

mod cart;
mod orders;

pub use cart::{CartIntent, CartViewModel, CartViewState};
pub use orders::{OrdersIntent, OrdersViewModel, OrdersViewState};
