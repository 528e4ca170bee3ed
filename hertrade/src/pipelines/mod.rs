// hertrade/src/pipelines/mod.rs

//! Defines and registers every workflow pipeline. Each context type in [`contexts`] maps to
//! exactly one pipeline in the `Flow` registry.

use crate::errors::AppError;
use flow::Flow;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod order_transition_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;
pub mod sms_relay_pipeline;

/// Called once while building `AppState`.
pub fn register_all_pipelines(flow_registry: &Flow<AppError>) {
  tracing::info!("Registering workflow pipelines...");

  signup_pipeline::register_signup_pipeline(flow_registry);
  signin_pipeline::register_signin_pipeline(flow_registry);
  cart_pipeline::register_add_to_cart_pipeline(flow_registry);
  checkout_pipeline::register_checkout_pipeline(flow_registry);
  order_transition_pipeline::register_order_transition_pipeline(flow_registry);
  sms_relay_pipeline::register_sms_relay_pipeline(flow_registry);

  tracing::info!("All application pipelines registered.");
}
