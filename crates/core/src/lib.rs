//! PocketShop Core - Shared domain types.
//!
//! This crate provides the types exchanged between PocketShop components:
//! - `storefront` - Remote Store client, cart engine, checkout and view-state projection
//! - `cli` - Terminal front end driving the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure derivations (cart totals,
//! order line freezing, date parsing) - no I/O, no HTTP clients. This keeps it
//! lightweight and usable from tests and tools alike.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, products, cart, orders, users

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
