//! Cart and checkout route handlers.
//!
//! Each mutation restores the cart from the browser's session record, applies
//! the change and writes the snapshot back before answering with the updated
//! view.

use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use dorodango_core::{Cart, CartItem, NewCartItem, PaymentMethod, ProductId};

use super::json::JsonBody;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CartSession;
use crate::state::AppState;

/// The cart as the presentation layer sees it.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    id: ProductId,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    method: PaymentMethod,
}

/// `GET /cart`
pub async fn show(cart: CartSession) -> Json<CartView> {
    Json(CartView::from(&cart.load().await))
}

/// `POST /cart/add`
#[instrument(skip(session), fields(product_id = %item.id))]
pub async fn add(session: CartSession, JsonBody(item): JsonBody<NewCartItem>) -> Result<Json<CartView>> {
    let mut cart = session.load().await;
    add_breadcrumb("cart", "Added item", Some(&[("product_id", item.id.as_str())]));
    cart.add_item(item);
    session.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/update`
#[instrument(skip(session))]
pub async fn update(
    session: CartSession,
    JsonBody(change): JsonBody<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = session.load().await;
    cart.update_quantity(&change.id, change.quantity);
    session.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/remove`
#[instrument(skip(session))]
pub async fn remove(session: CartSession, JsonBody(target): JsonBody<RemoveItem>) -> Result<Json<CartView>> {
    let mut cart = session.load().await;
    cart.remove_item(&target.id);
    session.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/clear`
#[instrument(skip(session))]
pub async fn clear(session: CartSession) -> Result<Json<CartView>> {
    let mut cart = session.load().await;
    cart.clear();
    session.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /checkout`
///
/// Waits out the simulated processing delay, then empties the cart and
/// answers with the receipt.
///
/// The session record is read once per request and written back whole when
/// the response leaves, so a cart change sent by the same browser while the
/// delay runs is overwritten by the emptied cart.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: CartSession,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let mut cart = session.load().await;
    let order = state.checkout().place(&mut cart, request.method).await?;
    session.save(&cart).await?;

    info!(order_id = %order.order_id, count = order.count, "Checkout complete");
    Ok(Json(json!({ "order": order })))
}
