//! Ready-made domain values.

use pocketshop_core::{
    CartItem, CartItemId, Order, OrderId, OrderProduct, OrderStatus, Product, ProductId,
    Timestamp, User, UserId,
};
use rust_decimal::Decimal;

/// A product priced at `cents / 100`, ten in stock.
#[must_use]
pub fn product(id: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Decimal::new(cents, 2),
        old_price: Decimal::new(cents, 2),
        description: None,
        image: None,
        category: Some("accessories".to_string()),
        color: None,
        stock: 10,
    }
}

#[must_use]
pub fn user(id: &str) -> User {
    User {
        id: UserId::new(id),
        first_name: "Amina".to_string(),
        last_name: "Benali".to_string(),
        email: format!("{id}@example.com"),
        password: "hunter22".to_string(),
        phone: "0600000000".to_string(),
        address: "12 Rue des Fleurs, Rabat".to_string(),
    }
}

#[must_use]
pub fn cart_item(id: &str, user_id: &UserId, product: Product, quantity: u32) -> CartItem {
    CartItem {
        id: CartItemId::new(id),
        user_id: user_id.clone(),
        product,
        quantity,
        created_at: None,
    }
}

/// A one-line order for `user_id` with the given date and status.
#[must_use]
pub fn order(id: &str, user_id: &UserId, date: Timestamp, status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: user_id.clone(),
        products: vec![OrderProduct {
            product_id: ProductId::new("p1"),
            quantity: 1,
            price: Decimal::new(1000, 2),
        }],
        shipping_address: "12 Rue des Fleurs, Rabat".to_string(),
        total: Decimal::new(1000, 2),
        date,
        status,
    }
}
