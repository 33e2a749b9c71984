//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (remote store reachable)
//!
//! # Catalog
//! GET    /products             - Product listing
//! POST   /products             - Add product (session required)
//! DELETE /products?id=<id>     - Remove product (session required)
//!
//! # Auth
//! POST   /auth                 - signup | login | logout | setSession
//! GET    /auth                 - Current session identity
//! GET    /auth/profile         - Stored profile (session required)
//!
//! # Cart
//! GET    /cart                 - Cart view
//! POST   /cart/add             - Add one of an item
//! POST   /cart/update          - Set an item's quantity
//! POST   /cart/remove          - Remove an item
//! POST   /cart/clear           - Empty the cart
//! POST   /checkout             - Simulated checkout
//!
//! # Contact
//! POST   /contact              - Contribute / collaborate submissions
//! ```

pub mod auth;
pub mod cart;
pub mod contact;
pub mod health;
pub mod json;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, contact_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/auth", post(auth::action).get(auth::current))
        .route("/auth/profile", get(auth::profile));

    if rate_limit {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the contact routes router.
fn contact_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new().route("/contact", post(contact::submit));

    if rate_limit {
        router.layer(contact_rate_limiter())
    } else {
        router
    }
}

/// Create the product routes router.
fn product_routes() -> Router<AppState> {
    Router::new().route(
        "/products",
        get(products::index)
            .post(products::create)
            .delete(products::delete),
    )
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/cart/clear", post(cart::clear))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
///
/// `rate_limit` switches the per-IP limiters on `/auth` and `/contact`; they
/// need a client IP header, so in-process callers turn them off.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(product_routes())
        .merge(auth_routes(rate_limit))
        .merge(cart_routes())
        .merge(contact_routes(rate_limit))
}
