// hertrade/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Role;
use crate::pipelines::contexts::{AddToCartCtxData, AddToCartOutcome};
use crate::services::cart_service::{self, QuantityUpdate};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;
use flow::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
}

fn default_quantity() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::view_cart", skip(app_state, caller), fields(user_id = %caller.profile_id))]
pub async fn view_cart_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  let view = cart_service::view_cart(
    app_state.store.as_ref(),
    caller.profile_id,
    app_state.config.delivery_fee_cents,
  )
  .await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, caller),
    fields(user_id = %caller.profile_id, product_id = %req_payload.product_id, quantity = %req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  let ctx_data = ContextData::new(AddToCartCtxData {
    app_state: app_state.get_ref().clone(),
    user_id: caller.profile_id,
    product_id: req_payload.product_id,
    quantity: req_payload.quantity,
    outcome: None,
  });

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let outcome = ctx_data.read().outcome.clone().ok_or_else(|| {
        warn!("Add to cart pipeline completed without an outcome.");
        AppError::Internal("Cart update completed, but item details are unavailable.".to_string())
      })?;
      match outcome {
        AddToCartOutcome::Added(item) => {
          info!(item_id = %item.id, "Item added to cart.");
          Ok(HttpResponse::Created().json(json!({
            "message": "Added to cart",
            "cart_item": item,
          })))
        }
        AddToCartOutcome::AlreadyInCart => Ok(HttpResponse::Ok().json(json!({
          "message": "Item already in cart",
        }))),
      }
    }
    PipelineResult::Stopped => {
      warn!("Add to cart pipeline was stopped by a handler.");
      Err(AppError::Internal("Process to add item to cart was halted.".to_string()))
    }
  }
}

#[instrument(name = "handler::update_cart_item", skip(app_state, caller, path, req_payload), fields(user_id = %caller.profile_id))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  let item_id = path.into_inner();
  match cart_service::update_quantity(app_state.store.as_ref(), caller.profile_id, item_id, req_payload.quantity).await? {
    QuantityUpdate::Updated(item) => Ok(HttpResponse::Ok().json(json!({
      "message": "Quantity updated",
      "cart_item": item,
    }))),
    QuantityUpdate::Ignored => Ok(HttpResponse::Ok().json(json!({
      "message": "Quantity must be at least 1; cart unchanged",
    }))),
  }
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, caller, path), fields(user_id = %caller.profile_id))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Client)?;
  cart_service::remove_item(app_state.store.as_ref(), caller.profile_id, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Removed from cart" })))
}
