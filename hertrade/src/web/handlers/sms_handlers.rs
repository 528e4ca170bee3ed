// hertrade/src/web/handlers/sms_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::{SmsRelayCtxData, SmsRelayOutcome};
use crate::state::AppState;
use flow::{ContextData, PipelineResult};

pub const RELAY_SECRET_HEADER: &str = "apikey";

/// Inbound message from the SMS gateway. `orderId` may still be sent by older gateway
/// configurations; it is accepted and ignored.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SmsRelayPayload {
  #[serde(default)]
  pub phone: String,
  #[serde(default, alias = "message")]
  pub keyword: String,
  #[serde(default)]
  pub order_id: Option<serde_json::Value>,
}

pub async fn sms_preflight_handler() -> HttpResponse {
  HttpResponse::Ok().body("ok")
}

#[instrument(name = "handler::sms_relay", skip(app_state, req, req_payload), fields(phone = %req_payload.phone))]
pub async fn sms_relay_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  req_payload: web::Json<SmsRelayPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  if payload.order_id.is_some() {
    info!("Ignoring legacy orderId in SMS payload.");
  }
  let provided_secret = req
    .headers()
    .get(RELAY_SECRET_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);

  let ctx_data = ContextData::new(SmsRelayCtxData::new(
    app_state.get_ref().clone(),
    payload.phone,
    payload.keyword,
    provided_secret,
  ));

  // Completed and Stopped runs both leave their outcome in the context.
  let _: PipelineResult = app_state.flow.run(ctx_data.clone()).await?;
  let (outcome, delivery_reference) = ctx_data.with(|c| (c.outcome.clone(), c.delivery_reference.clone()));
  match outcome {
    Some(SmsRelayOutcome::OrdersMarkedReady { count }) => Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "message": "Orders marked as ready for pickup",
      "updated_count": count,
      "delivery_reference": delivery_reference,
    }))),
    Some(SmsRelayOutcome::NoPendingOrders) => Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "message": "No pending orders",
      "updated_count": 0,
    }))),
    None => {
      warn!("SMS relay pipeline finished without an outcome.");
      Err(AppError::Internal("SMS relay finished without a result.".to_string()))
    }
  }
}
