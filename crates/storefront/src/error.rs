//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "<message>"}` with a matching status; server-side failures are
//! captured to Sentry before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use dorodango_core::CheckoutError;

use crate::db::RepositoryError;
use crate::middleware::cart::CartError;
use crate::services::{AuthError, CatalogError, MailError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart session could not be persisted.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Mail relay rejected or never received the message.
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A required integration is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_)
            | Self::Cart(_)
            | Self::Mail(_)
            | Self::Configuration(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::MissingFields | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Remote(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Checkout(CheckoutError::EmptyCart) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    // Don't expose internal error details to clients
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Cart(_) | Self::Internal(_) => {
                "Internal server error".to_owned()
            }
            Self::Mail(_) => "Failed to send message".to_owned(),
            Self::Auth(err) => match err {
                AuthError::MissingFields => "Missing required fields".to_owned(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::AccountNotFound => "Profile not found".to_owned(),
                AuthError::UserAlreadyExists => "Account already exists".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_owned()
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(invalid) => invalid.to_string(),
                CatalogError::NotFound(_) => "Product not found".to_owned(),
                CatalogError::Remote(_) => "Product store unavailable".to_owned(),
            },
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Configuration(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in identity.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: Option<&str>, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: user_id.map(String::from),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dorodango_core::{ProductError, ProductId};

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_owned());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".to_owned())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("x".to_owned())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::BadRequest("x".to_owned())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::Configuration("x".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Internal("x".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(AuthError::UserAlreadyExists.into()), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(CheckoutError::EmptyCart.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(CatalogError::NotFound(ProductId::new("nope")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CatalogError::Invalid(ProductError::MissingFields).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_messages_hide_internals() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_owned()));
        assert_eq!(err.message(), "Internal server error");

        let err = AppError::Auth(AuthError::UserAlreadyExists);
        assert_eq!(err.message(), "Account already exists");

        let err = AppError::Catalog(CatalogError::Invalid(ProductError::MissingFields));
        assert_eq!(err.message(), "All fields are required");
    }
}
