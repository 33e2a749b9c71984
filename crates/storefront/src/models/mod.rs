//! Domain models for the storefront.
//!
//! Products, carts and session identities live in `dorodango_core`; this module
//! holds the records that only the storefront persists.

pub mod account;
pub mod session;

pub use account::{Account, NewAccount, Profile};
pub use session::keys as session_keys;
