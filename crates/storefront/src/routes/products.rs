//! Catalog route handlers.
//!
//! Reads come from the local cache; writes are applied optimistically and
//! propagated to the remote store in the background.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use dorodango_core::{NewProduct, ProductId};

use super::json::JsonBody;
use crate::error::{AppError, Result};
use crate::middleware::RequireSession;
use crate::state::AppState;

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "products": state.catalog().products() }))
}

/// `POST /products`
#[instrument(skip(state, user, fields), fields(user_email = %user.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    JsonBody(fields): JsonBody<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().add_product(fields)?;
    Ok(Json(json!({ "product": product })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    id: Option<String>,
}

/// `DELETE /products?id=<id>`
#[instrument(skip(state, user), fields(user_email = %user.email))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Product id is required".to_owned()))?;

    state.catalog().remove_product(&ProductId::new(id))?;
    Ok(Json(json!({ "ok": true })))
}
