// hertrade/src/pipelines/checkout_pipeline.rs

//! Cart → orders. Validation happens before any read or write; every order insert and the cart
//! cleanup are committed by the store as one unit.

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::pricing;
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{error, info, warn};

pub fn register_checkout_pipeline(flow_registry: &Flow<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_delivery_address", false, None),
    ("load_cart_lines", false, None),
    ("price_order_lines", false, None),
    ("persist_orders_atomically", false, None),
  ]);

  p.on_step("validate_delivery_address", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (user_id, address) = ctx_data.with(|c| (c.user_id, c.delivery_address.trim().to_string()));
    if address.is_empty() {
      warn!(%user_id, "Checkout without a delivery address.");
      return Err(AppError::Validation("Please enter a delivery address.".to_string()));
    }
    ctx_data.write().delivery_address = address;
    Ok(PipelineControl::Continue)
  });

  // An empty cart ends the run here: nothing to order, nothing written.
  p.on_step("load_cart_lines", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (user_id, store) = {
      let guard = ctx_data.read();
      (guard.user_id, guard.app_state.store.clone())
    };

    let lines = store.cart_lines(user_id).await?;
    if lines.is_empty() {
      info!(%user_id, "Checkout with an empty cart; nothing to do.");
      return Ok(PipelineControl::Stop);
    }
    info!(%user_id, line_count = lines.len(), "Cart loaded for checkout.");
    ctx_data.write().cart_lines = lines;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("price_order_lines", |ctx_data: ContextData<CheckoutCtxData>| async move {
    {
      let mut guard = ctx_data.write();
      let fee = guard.app_state.config.delivery_fee_cents;
      let orders = pricing::price_orders(guard.user_id, &guard.cart_lines, fee, &guard.delivery_address);
      let totals = pricing::compute_total(&guard.cart_lines, fee);
      info!(
        user_id = %guard.user_id,
        subtotal = %pricing::format_cents(totals.subtotal_cents),
        total = %pricing::format_cents(totals.total_cents),
        "Checkout priced."
      );
      guard.priced_orders = orders;
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("persist_orders_atomically", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (user_id, orders, cart_item_ids, store) = {
      let guard = ctx_data.read();
      (
        guard.user_id,
        guard.priced_orders.clone(),
        guard.cart_lines.iter().map(|l| l.item_id).collect::<Vec<_>>(),
        guard.app_state.store.clone(),
      )
    };

    let created = store.commit_checkout(user_id, orders, cart_item_ids).await.map_err(|e| {
      error!(%user_id, error = %e, "Checkout commit failed; no orders were created.");
      e
    })?;
    info!(%user_id, order_count = created.len(), "Checkout committed.");
    ctx_data.write().created_orders = created;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}
