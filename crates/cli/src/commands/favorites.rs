//! Favorite product commands.

use std::io::Write;

use pocketshop_core::{FavoriteId, ProductId};
use pocketshop_storefront::AppState;

use super::CommandError;
use crate::render;

pub async fn list(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    let favorites = state.favorites().list().await?;
    render::favorites(out, &favorites)?;
    Ok(())
}

pub async fn add(state: &AppState, product_id: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let favorite = state.favorites().add(&ProductId::new(product_id)).await?;
    writeln!(out, "Favorite {} saved.", favorite.id)?;
    Ok(())
}

pub async fn remove(
    state: &AppState,
    favorite_id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    state.favorites().remove(&FavoriteId::new(favorite_id)).await?;
    writeln!(out, "Favorite removed.")?;
    Ok(())
}
