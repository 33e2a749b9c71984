//! JSON request bodies that reject with the storefront's error shape.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json`, but a malformed body answers `400 {"error": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
