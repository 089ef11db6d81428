//! Command implementations.
//!
//! Each command drives the storefront library and writes plain text to the
//! given writer. Failures come back as [`CommandError`]; the caller decides
//! how to show them.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod orders;

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A storefront operation failed.
    #[error(transparent)]
    Client(#[from] pocketshop_storefront::Error),

    /// The view settled on an error state; the message is already
    /// user-facing and was rendered.
    #[error("{0}")]
    View(String),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
