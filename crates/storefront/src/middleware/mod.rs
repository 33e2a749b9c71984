//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Cart session layer (tower-sessions, `doro_cart` cookie)
//! 5. Rate limiting on `/auth` and `/contact` (governor)
//!
//! Identity is not a layer: handlers read the signed `session` cookie through
//! the [`RequireSession`] and [`OptionalSession`] extractors.

pub mod auth;
pub mod cart;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalSession, RequireSession};
pub use cart::{CartError, CartSession};
pub use rate_limit::{auth_rate_limiter, contact_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{SessionSigner, create_session_layer};
