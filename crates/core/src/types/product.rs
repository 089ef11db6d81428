//! Catalog product.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as served by the Remote Store.
///
/// Immutable once fetched. Cart items embed a copy of this struct, so the
/// price a cart shows is the price at the time the item was added or last
/// confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Price before the current discount, shown struck through.
    #[serde(with = "rust_decimal::serde::float")]
    pub old_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image reference (URL or asset key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Whole-percent discount relative to `old_price`, if there is one.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        if self.old_price <= self.price || self.old_price.is_zero() {
            return None;
        }
        let ratio = self
            .old_price
            .checked_sub(self.price)?
            .checked_div(self.old_price)?
            .checked_mul(Decimal::ONE_HUNDRED)?;
        ratio.round().to_u32()
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Case-insensitive match on name or category.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

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
            stock: 4,
        }
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(laptop().discount_percent(), Some(39));
    }

    #[test]
    fn test_no_discount_when_old_price_not_higher() {
        let mut p = laptop();
        p.old_price = p.price;
        assert_eq!(p.discount_percent(), None);
    }

    #[test]
    fn test_matches_name_or_category() {
        let p = laptop();
        assert!(p.matches("revolution"));
        assert!(p.matches("PC"));
        assert!(p.matches("  "));
        assert!(!p.matches("mouse"));
    }

    #[test]
    fn test_deserializes_numeric_prices_and_defaults() {
        let json = r#"{"id":"PR9","name":"Mouse","price":21.5,"oldPrice":27}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, Decimal::new(215, 1));
        assert_eq!(p.old_price, Decimal::new(27, 0));
        assert_eq!(p.stock, 0);
        assert!(p.category.is_none());
    }
}
