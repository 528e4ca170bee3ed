// hertrade/src/pricing.rs

//! Cart totals and the per-order delivery fee split. All amounts are integer santim (ETB cents).

use crate::models::{CartLine, NewOrder};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
  pub subtotal_cents: i64,
  pub delivery_fee_cents: i64,
  pub total_cents: i64,
}

/// `subtotal = Σ price × qty`, `total = subtotal + delivery_fee`.
///
/// The fee is charged once per cart, not per line. An empty cart owes nothing.
pub fn compute_total(lines: &[CartLine], delivery_fee_cents: i64) -> CartTotals {
  let subtotal_cents: i64 = lines.iter().map(CartLine::line_amount_cents).sum();
  let delivery_fee_cents = if lines.is_empty() { 0 } else { delivery_fee_cents };
  CartTotals {
    subtotal_cents,
    delivery_fee_cents,
    total_cents: subtotal_cents + delivery_fee_cents,
  }
}

/// Splits `total_fee_cents` equally over `line_count` cart lines, regardless of quantity.
///
/// When the fee does not divide evenly the leftover santim go to the first lines, one each, so
/// the shares always add back up to the cart fee.
pub fn split_delivery_fee(total_fee_cents: i64, line_count: usize) -> Vec<i64> {
  if line_count == 0 {
    return Vec::new();
  }
  let n = line_count as i64;
  let base = total_fee_cents / n;
  let remainder = (total_fee_cents % n) as usize;
  (0..line_count).map(|i| if i < remainder { base + 1 } else { base }).collect()
}

/// One pending order per cart line: `amount = price × qty`, `total = amount + fee share`.
pub fn price_orders(user_id: Uuid, lines: &[CartLine], delivery_fee_cents: i64, delivery_address: &str) -> Vec<NewOrder> {
  let shares = split_delivery_fee(delivery_fee_cents, lines.len());
  lines
    .iter()
    .zip(shares)
    .map(|(line, fee_share)| {
      let amount_cents = line.line_amount_cents();
      NewOrder {
        product_id: line.product_id,
        user_id,
        supplier_id: line.supplier_id,
        amount_cents,
        delivery_fee_cents: fee_share,
        total_amount_cents: amount_cents + fee_share,
        delivery_address: delivery_address.to_string(),
      }
    })
    .collect()
}

/// `12345` → `"123.45 ETB"`.
pub fn format_cents(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02} ETB", sign, abs / 100, abs % 100)
}
