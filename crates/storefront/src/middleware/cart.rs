//! Cart persistence in the browser's session record.
//!
//! The cart is stored as its JSON snapshot under [`session_keys::CART`] after
//! every mutation and rebuilt on each request. An unreadable record yields an
//! empty cart.

use axum::{extract::FromRequestParts, http::request::Parts};
use thiserror::Error;
use tower_sessions::Session;
use tracing::warn;

use dorodango_core::Cart;

use crate::error::AppError;
use crate::models::session_keys;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("cart snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// The current browser's cart session.
pub struct CartSession(Session);

impl CartSession {
    /// Restore the cart, falling back to an empty one.
    pub async fn load(&self) -> Cart {
        match self.0.get::<String>(session_keys::CART).await {
            Ok(Some(snapshot)) => Cart::restore(&snapshot),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Could not read cart session, starting empty");
                Cart::new()
            }
        }
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the snapshot cannot be written to the session.
    pub async fn save(&self, cart: &Cart) -> Result<(), CartError> {
        self.0.insert(session_keys::CART, cart.snapshot()?).await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Internal("cart session layer missing".to_owned()))
    }
}
