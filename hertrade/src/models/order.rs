// hertrade/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  InProgress,
  Ready,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::InProgress => "in_progress",
      OrderStatus::Ready => "ready",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Only `status` ever changes after insert.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub supplier_id: Uuid,
  pub amount_cents: i64,
  pub delivery_fee_cents: i64,
  pub total_amount_cents: i64,
  pub delivery_address: String,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub product_id: Uuid,
  pub user_id: Uuid,
  /// Copied from the product when the order is priced.
  pub supplier_id: Uuid,
  pub amount_cents: i64,
  pub delivery_fee_cents: i64,
  pub total_amount_cents: i64,
  pub delivery_address: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BuyerOrderView {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub product_name: String,
  pub supplier_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierOrderView {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub product_name: String,
  pub client_name: String,
}
