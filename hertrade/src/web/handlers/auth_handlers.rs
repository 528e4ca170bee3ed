// hertrade/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::Role;
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;
use flow::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub name: String,
  pub phone: String,
  pub role: Role,
  #[serde(default = "default_has_smartphone")]
  pub has_smartphone: bool,
  #[serde(default)]
  pub bio: Option<String>,
}

fn default_has_smartphone() -> bool {
  true
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email, role = %req_payload.role)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SignupCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    name: payload.name,
    phone: payload.phone,
    role: payload.role,
    has_smartphone: payload.has_smartphone,
    bio: payload.bio,
    created_profile: None,
  });

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let profile = ctx_data.read().created_profile.clone().ok_or_else(|| {
        warn!("Signup pipeline completed without a profile in context.");
        AppError::Internal("Signup completed without creating a profile.".to_string())
      })?;
      info!(profile_id = %profile.id, "Signup successful.");
      Ok(HttpResponse::Created().json(json!({
        "message": "Account created successfully.",
        "profile": profile,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Signup pipeline was stopped by a handler.");
      Err(AppError::Internal("Signup process was halted by an internal step.".to_string()))
    }
  }
}

#[instrument(name = "handler::signin", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    account: None,
    profile: None,
    session: None,
  });

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (profile, session) = {
        let guard = ctx_data.read();
        (guard.profile.clone(), guard.session.clone())
      };
      let (profile, session) = profile.zip(session).ok_or_else(|| {
        warn!("Signin pipeline completed without a profile or session.");
        AppError::Auth("Signin completed without a session.".to_string())
      })?;
      info!(profile_id = %profile.id, "Signin successful.");
      Ok(HttpResponse::Ok().json(json!({
        "message": "Signin successful.",
        "token": session.token,
        "expires_at": session.expires_at,
        "profile": profile,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Signin pipeline was stopped by a handler.");
      Err(AppError::Auth("Authentication process was unexpectedly halted.".to_string()))
    }
  }
}

#[instrument(name = "handler::me", skip(app_state, caller), fields(profile_id = %caller.profile_id))]
pub async fn me_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  let profile = app_state
    .store
    .find_profile(caller.profile_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found.".to_string()))?;
  Ok(HttpResponse::Ok().json(profile))
}
