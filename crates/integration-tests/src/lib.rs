//! Integration test support for PocketShop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pocketshop-integration-tests
//! ```
//!
//! # Test Doubles
//!
//! - [`Backend`] - in-memory Remote Store data with call recording and
//!   fault injection
//! - [`FakeRemoteStore`] - in-process `RemoteStore` over a backend
//! - [`server`] - the same backend behind a real HTTP listener, for
//!   driving `HttpRemoteStore`
//!
//! # Example
//!
//! ```rust,ignore
//! let h = Harness::logged_in();
//! h.backend.disable_bulk_clear();
//! h.state.cart().clear().await?;
//! assert_eq!(h.backend.calls_to(Endpoint::DeleteCartItem), 3);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod fake;
pub mod fixtures;
pub mod server;

use std::sync::Arc;

use pocketshop_core::User;
use pocketshop_storefront::{AppState, ClientConfig, MemorySessionStore, Session};
use url::Url;

pub use backend::{Backend, Call, Endpoint, Fault};
pub use fake::{CartGate, FakeRemoteStore};

/// Base URL handed to services that never reach the network.
const FAKE_API_URL: &str = "http://remote-store.test/";

/// Configuration for an in-process harness.
///
/// # Panics
///
/// Never in practice; the URL is a constant.
#[must_use]
pub fn test_config() -> ClientConfig {
    let url = Url::parse(FAKE_API_URL).expect("constant URL is valid");
    ClientConfig::new(url)
}

/// Fully wired [`AppState`] over a fake Remote Store and an in-memory
/// session.
pub struct Harness {
    pub backend: Arc<Backend>,
    pub remote: FakeRemoteStore,
    pub session: Arc<MemorySessionStore>,
    pub state: AppState,
    /// The seeded user; logged in unless built with [`Harness::anonymous`].
    pub user: User,
}

impl Harness {
    /// Harness with `u1` registered on the backend and logged in.
    #[must_use]
    pub fn logged_in() -> Self {
        Self::build(test_config(), true)
    }

    /// Harness with `u1` registered on the backend but no session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::build(test_config(), false)
    }

    #[must_use]
    pub fn build(config: ClientConfig, logged_in: bool) -> Self {
        let backend = Arc::new(Backend::new());
        let user = fixtures::user("u1");
        backend.add_user(user.clone());

        let session = if logged_in {
            Session::logged_in(user.clone())
        } else {
            Session::default()
        };
        let session = Arc::new(MemorySessionStore::with_session(session));
        let remote = FakeRemoteStore::new(Arc::clone(&backend));
        let state = AppState::new(config, Arc::new(remote.clone()), session.clone());

        Self {
            backend,
            remote,
            session,
            state,
            user,
        }
    }
}
