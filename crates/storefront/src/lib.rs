//! PocketShop storefront client library.
//!
//! Talks to the PocketShop REST backend (the Remote Store) and keeps a
//! client-side cart in sync with it. Front ends build an [`AppState`] and
//! drive it through the view models in [`view`].
//!
//! ```rust,ignore
//! use pocketshop_storefront::{AppState, ClientConfig};
//! use pocketshop_storefront::view::CartIntent;
//!
//! let state = AppState::from_config(ClientConfig::from_env()?).await?;
//! let cart = state.cart_view();
//! let view = cart.dispatch(CartIntent::Load).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod orders;
pub mod profile;
pub mod remote;
pub mod session;
pub mod state;
pub mod view;

pub use cart::CartEngine;
pub use catalog::Catalog;
pub use checkout::Checkout;
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, Result};
pub use favorites::Favorites;
pub use orders::OrderService;
pub use profile::Profile;
pub use remote::{HttpRemoteStore, RemoteError, RemoteStore};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};
pub use state::AppState;
