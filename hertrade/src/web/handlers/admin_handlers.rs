// hertrade/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;

#[derive(Deserialize, Debug)]
pub struct VerificationPayload {
  pub verified: bool,
}

#[instrument(name = "handler::platform_stats", skip(app_state, caller))]
pub async fn platform_stats_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Admin)?;
  Ok(HttpResponse::Ok().json(app_state.store.platform_stats().await?))
}

#[instrument(name = "handler::pending_verifications", skip(app_state, caller))]
pub async fn pending_verifications_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Admin)?;
  let profiles = app_state.store.pending_verifications().await?;
  Ok(HttpResponse::Ok().json(json!({ "profiles": profiles })))
}

#[instrument(name = "handler::set_verification", skip(app_state, caller, path, req_payload), fields(profile_id = %path.as_ref(), verified = req_payload.verified))]
pub async fn set_verification_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  path: web::Path<Uuid>,
  req_payload: web::Json<VerificationPayload>,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Admin)?;
  let profile_id = path.into_inner();
  let profile = app_state
    .store
    .set_profile_verified(profile_id, req_payload.verified)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Profile with ID {} not found.", profile_id)))?;
  info!(admin_id = %caller.profile_id, "Profile verification updated.");
  Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}
