// hertrade/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// A cart item resolved against its product's current price and owning supplier.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
  pub item_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub supplier_id: Uuid,
  pub supplier_name: String,
  pub unit_price_cents: i64,
  pub quantity: i32,
}

impl CartLine {
  pub fn line_amount_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}
