// hertrade/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::Role;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::pricing;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;
use flow::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  #[serde(default)]
  pub delivery_address: String,
}

#[instrument(name = "handler::checkout", skip(app_state, caller, req_payload), fields(user_id = %caller.profile_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  let ctx_data = ContextData::new(CheckoutCtxData {
    app_state: app_state.get_ref().clone(),
    user_id: caller.profile_id,
    delivery_address: req_payload.into_inner().delivery_address,
    cart_lines: Vec::new(),
    priced_orders: Vec::new(),
    created_orders: Vec::new(),
  });

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (orders, totals) = {
        let guard = ctx_data.read();
        (
          guard.created_orders.clone(),
          pricing::compute_total(&guard.cart_lines, app_state.config.delivery_fee_cents),
        )
      };
      info!(order_count = orders.len(), total_cents = totals.total_cents, "Order placed.");
      Ok(HttpResponse::Created().json(json!({
        "message": "Order placed successfully!",
        "orders": orders,
        "totals": totals,
      })))
    }
    PipelineResult::Stopped => Ok(HttpResponse::Ok().json(json!({
      "message": "Your cart is empty.",
      "orders": [],
    }))),
  }
}
