// hertrade/src/services/delivery_mock.rs

//! Stand-in for the delivery integration. Orders that become `ready`, from the web buttons or the
//! SMS relay, are handed off here; a real courier dispatch would replace this module.

use crate::errors::Result as AppResult;
use crate::models::Order;
use tracing::info;
use uuid::Uuid;

/// Returns the courier reference for the batch.
pub async fn hand_off_ready_orders(supplier_id: Uuid, orders: &[Order]) -> AppResult<String> {
  let reference = format!("mock_delivery_{}", Uuid::new_v4());
  info!(
    %supplier_id,
    order_count = orders.len(),
    order_ids = ?orders.iter().map(|o| o.id).collect::<Vec<_>>(),
    %reference,
    "Simulated delivery hand-off for ready orders."
  );
  Ok(reference)
}
