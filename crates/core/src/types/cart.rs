//! Cart items and the in-memory cart snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId, UserId};
use super::product::Product;
use super::timestamp::Timestamp;

/// A cart line persisted by the Remote Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl CartItem {
    /// `price × quantity` for this line, or `None` if it overflows.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.quantity))
    }

    /// `price × quantity` for this line, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }

    /// Copy of this item with a different quantity, used as an update payload.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

/// Payload for creating a cart item. The Remote Store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product: Product,
    pub quantity: u32,
    pub created_at: Timestamp,
}

impl NewCartItem {
    #[must_use]
    pub fn new(user_id: UserId, product: Product, quantity: u32) -> Self {
        Self {
            user_id,
            product,
            quantity,
            created_at: Timestamp::now(),
        }
    }
}

/// Ordered list of cart items for one session.
///
/// Derived values are computed on demand and never stored. At most one item
/// per product is kept: [`CartSnapshot::upsert`] replaces rather than
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl CartSnapshot {
    /// Build a snapshot from a server listing, collapsing duplicate products
    /// into the last occurrence.
    #[must_use]
    pub fn new(items: Vec<CartItem>) -> Self {
        let mut snapshot = Self::default();
        for item in items {
            snapshot.upsert(item);
        }
        snapshot
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `Σ(price × quantity)`, saturating at [`Decimal::MAX`].
    ///
    /// Prices come from the server, so use [`CartSnapshot::checked_total`]
    /// where an out-of-range cart must be rejected.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    /// `Σ(price × quantity)`, or `None` if any step overflows.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.checked_line_total()?))
    }

    /// The checked total if the line for `product` held `quantity` units
    /// instead of its current quantity (or were added).
    #[must_use]
    pub fn checked_total_with(&self, product: &Product, quantity: u32) -> Option<Decimal> {
        let line = product.price.checked_mul(Decimal::from(quantity))?;
        self.items
            .iter()
            .filter(|item| item.product.id != product.id)
            .try_fold(line, |sum, item| sum.checked_add(item.checked_line_total()?))
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn get(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn find_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product.id == product_id)
    }

    /// Insert or replace a confirmed item.
    ///
    /// Matches an existing line by item ID or by product ID and replaces it in
    /// place; otherwise appends.
    pub fn upsert(&mut self, item: CartItem) {
        let position = self
            .items
            .iter()
            .position(|existing| existing.id == item.id || existing.product.id == item.product.id);

        match position {
            Some(index) => {
                // Drop any further line for the same product or id
                let (id, product_id) = (item.id.clone(), item.product.id.clone());
                let mut i = 0;
                self.items.retain(|existing| {
                    let keep = i <= index || (existing.id != id && existing.product.id != product_id);
                    i += 1;
                    keep
                });
                if let Some(slot) = self.items.get_mut(index) {
                    *slot = item;
                }
            }
            None => self.items.push(item),
        }
    }

    /// Remove an item by ID, returning it if present.
    pub fn remove(&mut self, id: &CartItemId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
