//! Simulated checkout.
//!
//! No payment is taken. Placing an order turns the current cart into an
//! [`OrderReceipt`] and empties the cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartItem};
use crate::types::OrderId;

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Netbanking,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Netbanking => "netbanking",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
}

/// What the shopper sees after placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub count: u64,
    pub placed_at: DateTime<Utc>,
}

/// Place an order for everything in `cart`, clearing it on success.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when there is nothing to buy; the cart
/// is left untouched.
pub fn place(
    cart: &mut Cart,
    method: PaymentMethod,
    now: DateTime<Utc>,
) -> Result<OrderReceipt, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let receipt = OrderReceipt {
        order_id: OrderId::generate(),
        method,
        items: cart.items().to_vec(),
        total: cart.total(),
        count: cart.count(),
        placed_at: now,
    };
    cart.clear();
    Ok(receipt)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::NewCartItem;
    use crate::types::ProductId;

    #[test]
    fn test_place_clears_cart_and_keeps_totals() {
        let mut cart = Cart::new();
        let tee = NewCartItem {
            id: ProductId::new("6"),
            name: "Block-Printed Cotton Tee".to_owned(),
            artisan: "Ravi Kumar".to_owned(),
            price: Decimal::from(1299),
            image: "/images/product-6.jpg".to_owned(),
        };
        cart.add_item(tee.clone());
        cart.add_item(tee);

        let receipt = place(&mut cart, PaymentMethod::Upi, Utc::now()).unwrap();
        assert_eq!(receipt.total, Decimal::from(2598));
        assert_eq!(receipt.count, 2);
        assert_eq!(receipt.items.len(), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_place_rejects_empty_cart() {
        let mut cart = Cart::new();
        assert_eq!(
            place(&mut cart, PaymentMethod::Card, Utc::now()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_payment_method_wire_names() {
        let method: PaymentMethod = serde_json::from_str("\"netbanking\"").unwrap();
        assert_eq!(method, PaymentMethod::Netbanking);
        assert!(serde_json::from_str::<PaymentMethod>("\"cash\"").is_err());
    }
}
