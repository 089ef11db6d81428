//! Plain-text rendering of view states.

use std::io::{self, Write};

use pocketshop_core::{CurrencyCode, Favorite, Order, Price, Product, User};
use pocketshop_storefront::view::{CartViewState, OrdersViewState};
use rust_decimal::Decimal;

fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

pub fn products(out: &mut impl Write, products: &[Product], currency: CurrencyCode) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in products {
        let discount = product
            .discount_percent()
            .map(|pct| format!("  (-{pct}%, was {})", money(product.old_price, currency)))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<10} {:<32} {:>12}{discount}",
            product.id.as_str(),
            product.name,
            money(product.price, currency)
        )?;
    }
    Ok(())
}

pub fn product(out: &mut impl Write, product: &Product, currency: CurrencyCode) -> io::Result<()> {
    writeln!(out, "{} ({})", product.name, product.id)?;
    writeln!(out, "Price:    {}", money(product.price, currency))?;
    if let Some(pct) = product.discount_percent() {
        writeln!(out, "Was:      {} (-{pct}%)", money(product.old_price, currency))?;
    }
    if let Some(category) = &product.category {
        writeln!(out, "Category: {category}")?;
    }
    if let Some(color) = &product.color {
        writeln!(out, "Color:    {color}")?;
    }
    let stock = if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "Out of stock".to_string()
    };
    writeln!(out, "Stock:    {stock}")?;
    if let Some(description) = &product.description {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    Ok(())
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    writeln!(out, "{} <{}>", user.display_name(), user.email)?;
    if !user.address.is_empty() {
        writeln!(out, "Ships to: {}", user.address)?;
    }
    Ok(())
}

pub fn cart(out: &mut impl Write, state: &CartViewState, currency: CurrencyCode) -> io::Result<()> {
    match state {
        CartViewState::Loading => writeln!(out, "Loading..."),
        CartViewState::NotAuthenticated => writeln!(out, "Log in to see your cart."),
        CartViewState::Empty => writeln!(out, "Your cart is empty."),
        CartViewState::Loaded {
            items,
            total,
            item_count,
        } => {
            for item in items {
                writeln!(
                    out,
                    "{:<10} {:<32} {:>3} x {:>10} = {:>12}",
                    item.id.as_str(),
                    item.product.name,
                    item.quantity,
                    money(item.product.price, currency),
                    money(item.line_total(), currency)
                )?;
            }
            writeln!(out, "{item_count} item(s), total {}", money(*total, currency))
        }
        CartViewState::CheckoutSucceeded { order } => {
            writeln!(out, "Order {} placed.", order.id)?;
            writeln!(out, "Total: {}", money(order.total, currency))
        }
        CartViewState::Error { message } => writeln!(out, "{message}"),
    }
}

fn order_line(out: &mut impl Write, order: &Order, currency: CurrencyCode) -> io::Result<()> {
    let date = order
        .date
        .to_datetime()
        .map_or_else(|| "unknown date".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string());
    writeln!(
        out,
        "{:<12} {date:<16} {:<11} {:>3} item(s) {:>12}",
        order.id.as_str(),
        order.status.label(),
        order.item_count(),
        money(order.total, currency)
    )
}

pub fn orders(out: &mut impl Write, state: &OrdersViewState, currency: CurrencyCode) -> io::Result<()> {
    if let Some(error) = &state.error {
        writeln!(out, "{error}")?;
    }
    if state.is_empty() {
        return writeln!(out, "No orders yet.");
    }
    for order in &state.orders {
        order_line(out, order, currency)?;
    }
    Ok(())
}

pub fn favorites(out: &mut impl Write, favorites: &[Favorite]) -> io::Result<()> {
    if favorites.is_empty() {
        return writeln!(out, "No favorites yet.");
    }
    for favorite in favorites {
        writeln!(out, "{:<10} {}", favorite.id.as_str(), favorite.product_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketshop_core::{CartItem, CartItemId, ProductId, UserId};

    fn laptop() -> Product {
        Product {
            id: ProductId::new("PR001"),
            name: "HP Revolution 6".to_string(),
            price: Decimal::new(379, 0),
            old_price: Decimal::new(619, 0),
            description: None,
            image: None,
            category: Some("pc".to_string()),
            color: None,
            stock: 0,
        }
    }

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn test_product_shows_discount_and_stock() {
        let text = rendered(|out| product(out, &laptop(), CurrencyCode::USD));
        assert!(text.contains("$379.00"));
        assert!(text.contains("(-39%)"));
        assert!(text.contains("Out of stock"));
    }

    #[test]
    fn test_loaded_cart_shows_total() {
        let item = CartItem {
            id: CartItemId::new("c1"),
            user_id: UserId::new("u1"),
            product: laptop(),
            quantity: 2,
            created_at: None,
        };
        let state = CartViewState::Loaded {
            total: item.line_total(),
            item_count: 2,
            items: vec![item],
        };
        let text = rendered(|out| cart(out, &state, CurrencyCode::MAD));
        assert!(text.contains("2 item(s), total 758.00 MAD"));
    }

    #[test]
    fn test_error_state_shows_message_only() {
        let state = CartViewState::Error {
            message: "Could not reach the server. Check your connection.".to_string(),
        };
        let text = rendered(|out| cart(out, &state, CurrencyCode::USD));
        assert_eq!(text, "Could not reach the server. Check your connection.\n");
    }
}
