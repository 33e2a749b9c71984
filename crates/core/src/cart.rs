//! Cart state container.
//!
//! A cart is an ordered list of line items with at most one entry per product
//! id. Totals are derived on every read and never stored. The container itself
//! is purely in memory; callers that want the cart to survive a reload mirror
//! [`Cart::snapshot`] into storage after each mutation and rebuild it with
//! [`Cart::restore`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub artisan: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    /// Always at least 1 while the item is in a cart.
    pub quantity: u32,
}

/// The product details captured when an item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub artisan: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

/// The cart container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from a stored snapshot.
    ///
    /// Anything unreadable yields an empty cart. Entries with a zero quantity
    /// are dropped and repeated ids are folded into the first occurrence.
    #[must_use]
    pub fn restore(snapshot: &str) -> Self {
        let Ok(stored) = serde_json::from_str::<Vec<CartItem>>(snapshot) else {
            return Self::new();
        };

        let mut cart = Self::new();
        for item in stored.into_iter().filter(|i| i.quantity > 0) {
            match cart.position(&item.id) {
                Some(idx) => {
                    if let Some(existing) = cart.items.get_mut(idx) {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Serialize the cart for storage.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of a product, merging with an existing line.
    pub fn add_item(&mut self, item: NewCartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }

        self.items.push(CartItem {
            id: item.id,
            name: item.name,
            artisan: item.artisan,
            price: item.price,
            image: item.image,
            quantity: 1,
        });
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() != before
    }

    /// Set a line's quantity; zero or below removes it, values past `u32::MAX`
    /// saturate.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(existing) = self.items.iter_mut().find(|i| &i.id == id) {
            existing.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }
}
