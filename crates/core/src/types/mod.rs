//! Core types for Dorodango.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod product;
pub mod session;

pub use email::{Email, EmailError};
pub use id::*;
pub use product::{MAX_PRODUCT_IMAGES, NewProduct, PLACEHOLDER_IMAGE, Product, ProductError};
pub use session::SessionUser;
