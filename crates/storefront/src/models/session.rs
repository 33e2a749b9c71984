//! Session-related constants.

/// Keys for data stored in the cart session record.
pub mod keys {
    /// Key for the serialized cart.
    pub const CART: &str = "dorodango-cart";
}
