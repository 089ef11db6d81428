//! Product browsing commands.

use std::io::Write;

use pocketshop_core::{CurrencyCode, ProductId};
use pocketshop_storefront::AppState;

use super::CommandError;
use crate::render;

/// List products, optionally filtered by a search query.
pub async fn list(
    state: &AppState,
    search: Option<&str>,
    currency: CurrencyCode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let products = match search {
        Some(query) => state.catalog().search(query).await?,
        None => state.catalog().products().await?,
    };
    render::products(out, &products, currency)?;
    Ok(())
}

pub async fn show(
    state: &AppState,
    id: &str,
    currency: CurrencyCode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let product = state.catalog().product(&ProductId::new(id)).await?;
    render::product(out, &product, currency)?;
    Ok(())
}
