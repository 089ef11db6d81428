//! Cart and checkout commands.
//!
//! Every invocation starts from a fresh process, so the cart is loaded from
//! the Remote Store before the requested intent runs.

use std::io::Write;

use pocketshop_core::{CartItemId, CurrencyCode, ProductId};
use pocketshop_storefront::AppState;
use pocketshop_storefront::view::{CartIntent, CartViewModel, CartViewState};

use super::CommandError;
use crate::render;

pub async fn add_intent(
    state: &AppState,
    product_id: &str,
    quantity: u32,
) -> Result<CartIntent, CommandError> {
    let product = state.catalog().product(&ProductId::new(product_id)).await?;
    Ok(CartIntent::Add { product, quantity })
}

pub fn set_intent(item_id: &str, quantity: i64) -> CartIntent {
    CartIntent::UpdateQuantity {
        item_id: CartItemId::new(item_id),
        quantity,
    }
}

pub fn remove_intent(item_id: &str) -> CartIntent {
    CartIntent::Remove {
        item_id: CartItemId::new(item_id),
    }
}

pub const fn clear_intent() -> CartIntent {
    CartIntent::Clear
}

/// Load the cart, then run `intent` (if any) and render the final state.
pub async fn run(
    state: &AppState,
    intent: Option<CartIntent>,
    currency: CurrencyCode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let view = state.cart_view();
    let settled = load_then(&view, intent).await;
    render::cart(out, &settled, currency)?;
    outcome(settled)
}

pub async fn checkout(
    state: &AppState,
    address: Option<String>,
    currency: CurrencyCode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let view = state.cart_view();
    let intent = CartIntent::Checkout {
        shipping_address: address,
    };
    let settled = load_then(&view, Some(intent)).await;
    render::cart(out, &settled, currency)?;
    outcome(settled)
}

async fn load_then(view: &CartViewModel, intent: Option<CartIntent>) -> CartViewState {
    let loaded = view.dispatch(CartIntent::Load).await;
    match (intent, &loaded) {
        (Some(intent), CartViewState::Empty | CartViewState::Loaded { .. }) => {
            view.dispatch(intent).await
        }
        _ => loaded,
    }
}

fn outcome(state: CartViewState) -> Result<(), CommandError> {
    match state {
        CartViewState::Error { message } => Err(CommandError::View(message)),
        CartViewState::NotAuthenticated => {
            Err(CommandError::View("Not logged in".to_string()))
        }
        _ => Ok(()),
    }
}
