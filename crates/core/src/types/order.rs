//! Orders and frozen order lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartItem, CartSnapshot};
use super::id::{OrderId, ProductId, UserId};
use super::status::OrderStatus;
use super::timestamp::Timestamp;

/// A frozen line item.
///
/// Copies the unit price at checkout time so later catalog price changes do
/// not rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&CartItem> for OrderProduct {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            quantity: item.quantity,
            price: item.product.price,
        }
    }
}

/// An order persisted by the Remote Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub products: Vec<OrderProduct>,
    pub shipping_address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date: Timestamp,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.quantity)).sum()
    }
}

/// Order submission payload. The Remote Store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub products: Vec<OrderProduct>,
    pub shipping_address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date: Timestamp,
    pub status: OrderStatus,
}

impl NewOrder {
    /// Freeze a cart snapshot into a pending order.
    ///
    /// The total is the sum of the frozen lines, which equals
    /// [`CartSnapshot::total`] for the same snapshot (saturating, so check
    /// [`CartSnapshot::checked_total`] first).
    #[must_use]
    pub fn from_cart(
        user_id: UserId,
        cart: &CartSnapshot,
        shipping_address: impl Into<String>,
        date: Timestamp,
    ) -> Self {
        let products: Vec<OrderProduct> = cart.items().iter().map(OrderProduct::from).collect();
        let total = cart.total();
        Self {
            user_id,
            products,
            shipping_address: shipping_address.into(),
            total,
            date,
            status: OrderStatus::Pending,
        }
    }
}

/// Generic acknowledgement body returned by state-changing order endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CartItemId, Product};

    fn cart() -> CartSnapshot {
        let line = |id: &str, cents: i64, quantity: u32| CartItem {
            id: CartItemId::new(id),
            user_id: UserId::new("u1"),
            product: Product {
                id: ProductId::new(format!("p{id}")),
                name: id.to_string(),
                price: Decimal::new(cents, 2),
                old_price: Decimal::new(cents, 2),
                description: None,
                image: None,
                category: None,
                color: None,
                stock: 1,
            },
            quantity,
            created_at: None,
        };
        CartSnapshot::new(vec![line("1", 37_900, 2), line("2", 2_195, 3)])
    }

    #[test]
    fn test_from_cart_freezes_lines_and_total() {
        let cart = cart();
        let order = NewOrder::from_cart(
            UserId::new("u1"),
            &cart,
            "12 Rue des Fleurs, Rabat",
            Timestamp::Epoch(1),
        );
        assert_eq!(order.products.len(), 2);
        assert_eq!(order.products[1].price, Decimal::new(2_195, 2));
        assert_eq!(order.total, cart.total());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_order_deserializes_string_date_and_missing_status() {
        let json = r#"{
            "id": "o1",
            "userId": "u1",
            "products": [{"productId": "p1", "quantity": 2, "price": 10.5}],
            "shippingAddress": "Somewhere 12345",
            "total": 21.0,
            "date": "1700000000000"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.date.sort_key(), 1_700_000_000_000);
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn test_api_response_without_message() {
        let resp: ApiResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(resp.success);
        assert!(resp.message.is_none());
    }
}
