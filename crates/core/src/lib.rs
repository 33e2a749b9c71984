//! Dorodango Core - Shared domain types and state containers.
//!
//! This crate provides the types used across all Dorodango components:
//! - `storefront` - Public JSON storefront (catalog, auth, cart, checkout, contact)
//! - `cli` - Command-line tools for migrations and catalog maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and synchronous state containers - no I/O,
//! no database access, no HTTP clients. Persistence and remote synchronization
//! live in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids and emails, plus product and session records
//! - [`cart`] - The cart state container
//! - [`checkout`] - Simulated checkout and order receipts
//! - [`defaults`] - The compiled-in default catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod defaults;
pub mod types;

pub use cart::{Cart, CartItem, NewCartItem};
pub use checkout::{CheckoutError, OrderReceipt, PaymentMethod};
pub use types::*;
