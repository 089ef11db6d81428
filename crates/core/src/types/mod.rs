//! Core types for PocketShop.
//!
//! This module provides type-safe wrappers for the storefront domain. Field
//! names follow the Remote Store's camelCase JSON.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod timestamp;
pub mod user;

pub use cart::{CartItem, CartSnapshot, NewCartItem};
pub use id::*;
pub use order::{ApiResponse, NewOrder, Order, OrderProduct};
pub use price::{CurrencyCode, Price};
pub use product::Product;
pub use status::OrderStatus;
pub use timestamp::Timestamp;
pub use user::{Email, EmailError, Favorite, NewFavorite, RegisterRequest, User};
