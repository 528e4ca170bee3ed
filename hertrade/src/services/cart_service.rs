// hertrade/src/services/cart_service.rs

//! Cart reads and in-place edits. Adding an item goes through the add-to-cart pipeline.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{CartItem, CartLine};
use crate::pricing::{self, CartTotals};
use crate::store::Store;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub totals: CartTotals,
}

#[derive(Debug, Clone)]
pub enum QuantityUpdate {
  Updated(CartItem),
  /// Quantities below 1 are ignored; the item keeps its current quantity.
  Ignored,
}

#[instrument(name = "cart_service::view_cart", skip(store))]
pub async fn view_cart(store: &dyn Store, user_id: Uuid, delivery_fee_cents: i64) -> AppResult<CartView> {
  let lines = store.cart_lines(user_id).await?;
  let totals = pricing::compute_total(&lines, delivery_fee_cents);
  Ok(CartView { lines, totals })
}

#[instrument(name = "cart_service::update_quantity", skip(store))]
pub async fn update_quantity(store: &dyn Store, user_id: Uuid, item_id: Uuid, quantity: i32) -> AppResult<QuantityUpdate> {
  if quantity < 1 {
    debug!(quantity, "Ignoring cart quantity below 1.");
    return Ok(QuantityUpdate::Ignored);
  }
  store
    .update_cart_quantity(user_id, item_id, quantity)
    .await?
    .map(QuantityUpdate::Updated)
    .ok_or_else(|| AppError::NotFound(format!("Cart item with ID {} not found.", item_id)))
}

#[instrument(name = "cart_service::remove_item", skip(store))]
pub async fn remove_item(store: &dyn Store, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
  if store.delete_cart_item(user_id, item_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound(format!("Cart item with ID {} not found.", item_id)))
  }
}
