// hertrade/src/pipelines/order_transition_pipeline.rs

//! One order, one status change, one compare-and-set write.

use crate::errors::AppError;
use crate::lifecycle::{self, TransitionActor, TransitionOutcome};
use crate::models::OrderStatus;
use crate::pipelines::contexts::OrderTransitionCtxData;
use crate::services::delivery_mock;
use flow::{ContextData, Flow, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_order_transition_pipeline(flow_registry: &Flow<AppError>) {
  let not_a_supplier: SkipCondition<OrderTransitionCtxData> =
    Arc::new(|ctx_data: ContextData<OrderTransitionCtxData>| ctx_data.read().actor != TransitionActor::Supplier);
  let not_newly_ready: SkipCondition<OrderTransitionCtxData> = Arc::new(|ctx_data: ContextData<OrderTransitionCtxData>| {
    let guard = ctx_data.read();
    guard.to != OrderStatus::Ready || !guard.outcome.as_ref().is_some_and(TransitionOutcome::is_applied)
  });

  let mut p = Pipeline::<OrderTransitionCtxData, AppError>::new(&[
    ("check_transition_rule", false, None),
    ("load_order", false, None),
    ("verify_supplier_ownership", false, Some(not_a_supplier)),
    ("compare_and_set_status", false, None),
    ("hand_off_to_delivery", true, Some(not_newly_ready)),
  ]);

  p.on_step("check_transition_rule", |ctx_data: ContextData<OrderTransitionCtxData>| async move {
    let (actor, from, to) = ctx_data.with(|c| (c.actor, c.from, c.to));
    if !lifecycle::can_transition(actor, from, to) {
      warn!(?actor, %from, %to, "Transition not allowed for actor.");
      return Err(AppError::Validation(format!(
        "Cannot move an order from '{}' to '{}'.",
        from, to
      )));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("load_order", |ctx_data: ContextData<OrderTransitionCtxData>| async move {
    let (order_id, store) = {
      let guard = ctx_data.read();
      (guard.order_id, guard.app_state.store.clone())
    };
    let order = store
      .find_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_step("verify_supplier_ownership", |ctx_data: ContextData<OrderTransitionCtxData>| async move {
    let (owner, actor_profile_id, order_id) = {
      let guard = ctx_data.read();
      (guard.order.as_ref().map(|o| o.supplier_id), guard.actor_profile_id, guard.order_id)
    };
    if owner != Some(actor_profile_id) {
      warn!(%order_id, %actor_profile_id, "Supplier tried to update another supplier's order.");
      return Err(AppError::Forbidden("You can only update your own orders.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  // The pre-read above is advisory; this predicate is what actually serialises racing actors.
  p.on_step("compare_and_set_status", |ctx_data: ContextData<OrderTransitionCtxData>| async move {
    let (order_id, actor, actor_profile_id, from, to, store) = {
      let guard = ctx_data.read();
      (
        guard.order_id,
        guard.actor,
        guard.actor_profile_id,
        guard.from,
        guard.to,
        guard.app_state.store.clone(),
      )
    };
    let supplier_guard = (actor == TransitionActor::Supplier).then_some(actor_profile_id);

    let outcome = match store.transition_order(order_id, from, to, supplier_guard).await? {
      Some(order) => {
        info!(%order_id, ?actor, %from, %to, "Order status transitioned.");
        TransitionOutcome::Applied(order)
      }
      None => {
        let current = store.find_order(order_id).await?.map(|o| o.status);
        info!(%order_id, ?actor, %from, %to, ?current, "Stale transition; order already moved.");
        TransitionOutcome::Stale { current }
      }
    };
    ctx_data.write().outcome = Some(outcome);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // Same best-effort hand-off the SMS relay does; the status change stands either way.
  p.on_step("hand_off_to_delivery", |ctx_data: ContextData<OrderTransitionCtxData>| async move {
    let (order_id, order) = {
      let guard = ctx_data.read();
      let order = match &guard.outcome {
        Some(TransitionOutcome::Applied(order)) => Some(order.clone()),
        _ => None,
      };
      (guard.order_id, order)
    };
    let Some(order) = order else {
      return Ok(PipelineControl::Continue);
    };
    match delivery_mock::hand_off_ready_orders(order.supplier_id, std::slice::from_ref(&order)).await {
      Ok(reference) => ctx_data.write().delivery_reference = Some(reference),
      Err(e) => warn!(%order_id, error = %e, "Delivery hand-off failed; order stays ready."),
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(p);
  info!("Order transition pipeline registered.");
}
