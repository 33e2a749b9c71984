//! Simulated payment processing.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument};

use dorodango_core::checkout::{self, CheckoutError, OrderReceipt, PaymentMethod};
use dorodango_core::Cart;

/// Places orders after a fixed processing delay.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutService {
    delay: Duration,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Turn the cart into a receipt, emptying it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` without waiting if there is nothing to buy.
    #[instrument(skip(self, cart), fields(items = cart.items().len()))]
    pub async fn place(
        &self,
        cart: &mut Cart,
        method: PaymentMethod,
    ) -> Result<OrderReceipt, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let receipt = checkout::place(cart, method, Utc::now())?;
        info!(order_id = %receipt.order_id, %method, total = %receipt.total, "Order placed");
        Ok(receipt)
    }
}
