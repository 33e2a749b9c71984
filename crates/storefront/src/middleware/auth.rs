//! Identity extractors.
//!
//! The signed `session` cookie is the only identity the server trusts.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use dorodango_core::SessionUser;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a signed-in identity.
///
/// Rejects with `401 {"error": "Sign in required"}` when the cookie is
/// missing or does not verify.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireSession(user): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireSession(pub SessionUser);

impl<S> FromRequestParts<S> for RequireSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = state
            .signer()
            .read(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_owned()))?;

        tracing::Span::current().record("user_email", user.email.as_str());
        Ok(Self(user))
    }
}

/// Extractor that optionally reads the signed-in identity.
pub struct OptionalSession(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(state.signer().read(&parts.headers)))
    }
}
