// hertrade/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::lifecycle::{TransitionActor, TransitionOutcome};
use crate::models::{OrderStatus, Role};
use crate::pipelines::contexts::OrderTransitionCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;
use flow::{ContextData, PipelineResult};

#[instrument(name = "handler::buyer_orders", skip(app_state, caller), fields(user_id = %caller.profile_id))]
pub async fn buyer_orders_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  let orders = app_state.store.list_buyer_orders(caller.profile_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::supplier_orders", skip(app_state, caller), fields(supplier_id = %caller.profile_id))]
pub async fn supplier_orders_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Supplier)?;
  let orders = app_state.store.list_supplier_orders(caller.profile_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::supplier_stats", skip(app_state, caller), fields(supplier_id = %caller.profile_id))]
pub async fn supplier_stats_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Supplier)?;
  let stats = app_state.store.supplier_stats(caller.profile_id).await?;
  Ok(HttpResponse::Ok().json(stats))
}

pub async fn accept_order_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  run_supplier_transition(app_state, caller, path.into_inner(), OrderStatus::Pending, OrderStatus::InProgress).await
}

pub async fn mark_ready_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  run_supplier_transition(app_state, caller, path.into_inner(), OrderStatus::InProgress, OrderStatus::Ready).await
}

#[instrument(name = "handler::supplier_transition", skip(app_state, caller), fields(supplier_id = %caller.profile_id))]
async fn run_supplier_transition(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  order_id: Uuid,
  from: OrderStatus,
  to: OrderStatus,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Supplier)?;
  let ctx_data = ContextData::new(OrderTransitionCtxData::new(
    app_state.get_ref().clone(),
    order_id,
    TransitionActor::Supplier,
    caller.profile_id,
    from,
    to,
  ));

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (outcome, delivery_reference) = ctx_data.with(|c| (c.outcome.clone(), c.delivery_reference.clone()));
      let outcome = outcome.ok_or_else(|| {
        warn!(%order_id, "Transition pipeline completed without an outcome.");
        AppError::Internal("Order update completed without a result.".to_string())
      })?;
      let body = match outcome {
        TransitionOutcome::Applied(order) => {
          info!(%order_id, status = %order.status, "Order updated by supplier.");
          json!({
            "applied": true,
            "status": order.status,
            "message": format!("Order marked as {}", order.status),
            "delivery_reference": delivery_reference,
          })
        }
        TransitionOutcome::Stale { current } => json!({
          "applied": false,
          "status": current,
          "message": "Order was already updated",
        }),
      };
      Ok(HttpResponse::Ok().json(body))
    }
    PipelineResult::Stopped => {
      warn!(%order_id, "Transition pipeline was stopped by a handler.");
      Err(AppError::Internal("Order update was halted.".to_string()))
    }
  }
}
