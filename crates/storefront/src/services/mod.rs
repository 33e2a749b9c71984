//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password signup/login and profile documents
//! - `catalog` - The product state container (cache-first load, sync, migration)
//! - `writer` - Background propagation of catalog writes with retry
//! - `checkout` - Simulated payment processing
//! - `contact` - Contact form submissions and message composition
//! - `mail` - Outbound mail relay (Resend)

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod mail;
pub mod writer;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogState, MigrationOutcome, ProductCatalog, SyncPolicy, SyncReport};
pub use checkout::CheckoutService;
pub use contact::ContactSubmission;
pub use mail::{MailError, MailRelay, OutgoingMail, ResendClient};
pub use writer::{RemoteWrite, RemoteWriter, RetryPolicy, WriteFailure};
