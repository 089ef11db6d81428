//! Order history commands.

use std::io::Write;

use pocketshop_core::{CurrencyCode, OrderId};
use pocketshop_storefront::AppState;
use pocketshop_storefront::view::OrdersIntent;

use super::CommandError;
use crate::render;

pub fn cancel_intent(order_id: &str) -> OrdersIntent {
    OrdersIntent::Cancel(OrderId::new(order_id))
}

pub fn reorder_intent(order_id: &str) -> OrdersIntent {
    OrdersIntent::Reorder(OrderId::new(order_id))
}

/// Load the order list, then run `intent` (if any) and render the result.
pub async fn run(
    state: &AppState,
    intent: Option<OrdersIntent>,
    currency: CurrencyCode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    if state.profile().current_user().is_none() {
        return Err(pocketshop_storefront::Error::NotAuthenticated.into());
    }

    let view = state.orders_view();
    let mut settled = view.dispatch(OrdersIntent::Load).await;
    if let Some(intent) = intent
        && settled.error.is_none()
    {
        settled = view.dispatch(intent).await;
    }

    render::orders(out, &settled, currency)?;
    match settled.error {
        Some(message) => Err(CommandError::View(message)),
        None => Ok(()),
    }
}
