// hertrade/src/pipelines/sms_relay_pipeline.rs

//! SMS keyword relay: a supplier without a smartphone replies "a" and every one of their open
//! orders becomes `ready` in a single conditional bulk write.

use crate::errors::AppError;
use crate::lifecycle;
use crate::models::OrderStatus;
use crate::pipelines::contexts::{SmsRelayCtxData, SmsRelayOutcome};
use crate::services::delivery_mock;
use flow::{ContextData, Flow, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{info, warn};

pub const READY_KEYWORD: &str = "a";
pub const INVALID_KEYWORD_MESSAGE: &str = "Invalid keyword. Send \"a\" to confirm order is ready.";

pub fn normalize_keyword(raw: &str) -> String {
  raw.trim().to_lowercase()
}

pub fn register_sms_relay_pipeline(flow_registry: &Flow<AppError>) {
  let no_secret_configured: SkipCondition<SmsRelayCtxData> = Arc::new(|ctx_data: ContextData<SmsRelayCtxData>| {
    ctx_data.read().app_state.config.sms_relay_secret.is_none()
  });

  let mut p = Pipeline::<SmsRelayCtxData, AppError>::new(&[
    ("verify_relay_secret", false, Some(no_secret_configured)),
    ("match_keyword", false, None),
    ("find_supplier_by_phone", false, None),
    ("mark_orders_ready", false, None),
    ("hand_off_to_delivery", true, None),
  ]);

  p.on_step("verify_relay_secret", |ctx_data: ContextData<SmsRelayCtxData>| async move {
    let authorized = ctx_data.with(|c| {
      match (&c.app_state.config.sms_relay_secret, &c.provided_secret) {
        (Some(expected), Some(provided)) => expected == provided,
        (None, _) => true,
        _ => false,
      }
    });
    if !authorized {
      warn!("SMS relay request with a missing or wrong apikey.");
      return Err(AppError::Auth("Invalid relay credentials.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("match_keyword", |ctx_data: ContextData<SmsRelayCtxData>| async move {
    let (phone, keyword) = ctx_data.with(|c| (c.phone.trim().to_string(), normalize_keyword(&c.keyword)));
    if keyword != READY_KEYWORD {
      info!(%phone, %keyword, "Unrecognised SMS keyword.");
      return Err(AppError::Validation(INVALID_KEYWORD_MESSAGE.to_string()));
    }
    if phone.is_empty() {
      return Err(AppError::Validation("Phone number is required.".to_string()));
    }
    {
      let mut guard = ctx_data.write();
      guard.phone = phone;
      guard.keyword = keyword;
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("find_supplier_by_phone", |ctx_data: ContextData<SmsRelayCtxData>| async move {
    let (phone, store) = {
      let guard = ctx_data.read();
      (guard.phone.clone(), guard.app_state.store.clone())
    };
    match store.find_sms_supplier_by_phone(&phone).await? {
      Some(supplier) => {
        info!(%phone, supplier_id = %supplier.id, "SMS supplier matched.");
        ctx_data.write().supplier = Some(supplier);
        Ok(PipelineControl::Continue)
      }
      None => {
        warn!(%phone, "No SMS-only supplier registered for phone.");
        Err(AppError::NotFound("Supplier not found".to_string()))
      }
    }
  });

  // Replays match zero rows and stop here with "no pending orders".
  p.on_step("mark_orders_ready", |ctx_data: ContextData<SmsRelayCtxData>| async move {
    let (supplier_id, store) = {
      let guard = ctx_data.read();
      let supplier_id = guard
        .supplier
        .as_ref()
        .map(|s| s.id)
        .ok_or_else(|| AppError::Internal("Supplier missing before bulk update.".to_string()))?;
      (supplier_id, guard.app_state.store.clone())
    };

    let updated = store
      .bulk_transition_supplier_orders(supplier_id, &lifecycle::relay_source_states(), OrderStatus::Ready)
      .await?;

    let mut guard = ctx_data.write();
    if updated.is_empty() {
      info!(%supplier_id, "No pending orders for SMS supplier.");
      guard.outcome = Some(SmsRelayOutcome::NoPendingOrders);
      return Ok(PipelineControl::Stop);
    }
    info!(%supplier_id, updated_count = updated.len(), "Orders marked ready via SMS.");
    guard.outcome = Some(SmsRelayOutcome::OrdersMarkedReady { count: updated.len() });
    guard.updated_orders = updated;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // Best effort: a failed hand-off is logged and does not undo the status change.
  p.on_step("hand_off_to_delivery", |ctx_data: ContextData<SmsRelayCtxData>| async move {
    let (supplier_id, orders) = {
      let guard = ctx_data.read();
      (guard.supplier.as_ref().map(|s| s.id), guard.updated_orders.clone())
    };
    let Some(supplier_id) = supplier_id else {
      return Ok(PipelineControl::Continue);
    };
    match delivery_mock::hand_off_ready_orders(supplier_id, &orders).await {
      Ok(reference) => ctx_data.write().delivery_reference = Some(reference),
      Err(e) => warn!(%supplier_id, error = %e, "Delivery hand-off failed; orders stay ready."),
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(p);
  info!("SMS relay pipeline registered.");
}
