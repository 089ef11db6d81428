//! Unified error handling with Sentry integration.
//!
//! Every service returns [`Result<T>`]. Presentation code shows
//! [`Error::user_message`] and calls [`Error::report`]; raw transport errors
//! never reach the user.

use pocketshop_core::{CartItemId, OrderId};
use thiserror::Error;

use crate::remote::RemoteError;
use crate::session::SessionError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation needs a logged-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Input rejected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Checkout on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The item is not in the local cart snapshot.
    #[error("Unknown cart item: {0}")]
    UnknownCartItem(CartItemId),

    /// Cart prices times quantities exceed what a decimal can hold.
    #[error("Cart total is out of range")]
    TotalOutOfRange,

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order cannot be cancelled: {0}")]
    OrderNotCancellable(OrderId),

    #[error("Forbidden")]
    Forbidden,

    /// The server refused because of conflicting state (e.g. items no
    /// longer available for a reorder).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists")]
    AccountExists,

    /// Remote Store call failed.
    #[error("Remote Store error: {0}")]
    Remote(#[from] RemoteError),

    /// A partial clear failed and so did the resync that followed; the
    /// local snapshot may not match the server.
    #[error("Cart state is inconsistent: {cause} (resync failed: {resync})")]
    InconsistentState {
        cause: Box<RemoteError>,
        resync: Box<RemoteError>,
    },

    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The Remote Store failure behind this error, if any.
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            Self::InconsistentState { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Errors worth capturing to Sentry: infrastructure failures, not user
    /// mistakes or business rule rejections.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Remote(_) | Self::InconsistentState { .. } | Self::Session(_)
        )
    }

    /// Text safe to show to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please log in to continue.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::UnknownCartItem(_) => "That item is no longer in your cart.".to_string(),
            Self::TotalOutOfRange => "The cart total is too large to process.".to_string(),
            Self::OrderNotFound(_) => "Order not found.".to_string(),
            Self::OrderNotCancellable(_) => "This order can no longer be cancelled.".to_string(),
            Self::Forbidden => "You are not allowed to modify this order.".to_string(),
            Self::Conflict(_) => "Some items are no longer available.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::AccountExists => "An account with this email already exists.".to_string(),
            Self::Remote(err) => remote_message(err),
            Self::InconsistentState { .. } => {
                "Your cart could not be synchronized. Please refresh and try again.".to_string()
            }
            Self::Session(_) => "Could not save your session.".to_string(),
        }
    }

    /// Log the error and capture infrastructure failures to Sentry.
    pub fn report(&self) {
        if self.is_infrastructure() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::info!(error = %self, "Operation rejected");
        }
    }
}

fn remote_message(err: &RemoteError) -> String {
    match err {
        RemoteError::Status { status, .. } => match status {
            401 => "Your session has expired. Please log in again.".to_string(),
            403 => "Access denied.".to_string(),
            404 => "The requested item could not be found.".to_string(),
            500..=599 => "The server is having trouble. Please try again later.".to_string(),
            other => format!("The request was rejected (HTTP {other})."),
        },
        RemoteError::Timeout => "The server took too long to respond.".to_string(),
        RemoteError::Connect(_) => "Could not reach the server. Check your connection.".to_string(),
        RemoteError::Http(_)
        | RemoteError::Parse(_)
        | RemoteError::EmptyBody
        | RemoteError::InvalidUrl(_)
        | RemoteError::InvalidHeader(_) => "Unexpected response from the server.".to_string(),
    }
}

/// Set the Sentry user context.
///
/// Call this after login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
