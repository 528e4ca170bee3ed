// hertrade/src/pipelines/signin_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{event, warn, Level};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub fn register_signin_pipeline(flow_registry: &Flow<AppError>) {
  let mut signin_p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_account_by_email_signin", false, None),
    ("verify_password_signin", false, None),
    ("load_profile_signin", false, None),
    ("issue_session_signin", false, None),
  ]);

  signin_p.on_step("validate_signin_input", |ctx_data: ContextData<SigninCtxData>| async move {
    let (email_empty, password_empty) = ctx_data.with(|c| (c.email.trim().is_empty(), c.password.is_empty()));
    if email_empty || password_empty {
      return Err(AppError::Validation("Email and password are required.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  signin_p.on_step("fetch_account_by_email_signin", |ctx_data: ContextData<SigninCtxData>| async move {
    let (email, store) = {
      let guard = ctx_data.read();
      (guard.email.trim().to_string(), guard.app_state.store.clone())
    };

    match store.find_account_by_email(&email).await? {
      Some(account) => {
        event!(Level::DEBUG, account_id = %account.id, "Account found for signin.");
        ctx_data.write().account = Some(account);
        Ok(PipelineControl::Continue)
      }
      None => {
        warn!(%email, "Signin for unknown email.");
        Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
      }
    }
  });

  signin_p.on_step("verify_password_signin", |ctx_data: ContextData<SigninCtxData>| async move {
    let (stored_hash, password, account_id) = {
      let guard = ctx_data.read();
      let account = guard
        .account
        .as_ref()
        .ok_or_else(|| AppError::Internal("Account missing before password verification.".to_string()))?;
      (account.password_hash.clone(), guard.password.clone(), account.id)
    };

    if !auth_service::verify_password(&stored_hash, &password)? {
      warn!(%account_id, "Password mismatch on signin.");
      return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  signin_p.on_step("load_profile_signin", |ctx_data: ContextData<SigninCtxData>| async move {
    let (account_id, store) = {
      let guard = ctx_data.read();
      let account_id = guard
        .account
        .as_ref()
        .map(|a| a.id)
        .ok_or_else(|| AppError::Internal("Account missing before profile lookup.".to_string()))?;
      (account_id, guard.app_state.store.clone())
    };

    let profile = store.find_profile_by_account(account_id).await?.ok_or_else(|| {
      event!(Level::ERROR, %account_id, "Account has no profile.");
      AppError::Internal("Account has no profile.".to_string())
    })?;
    ctx_data.write().profile = Some(profile);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  signin_p.on_step("issue_session_signin", |ctx_data: ContextData<SigninCtxData>| async move {
    let (profile_id, ttl_hours, store) = {
      let guard = ctx_data.read();
      let profile_id = guard
        .profile
        .as_ref()
        .map(|p| p.id)
        .ok_or_else(|| AppError::Internal("Profile missing before session issue.".to_string()))?;
      (profile_id, guard.app_state.config.session_ttl_hours, guard.app_state.store.clone())
    };

    let session = auth_service::new_session(profile_id, ttl_hours);
    store.insert_session(session.clone()).await?;
    event!(Level::INFO, %profile_id, expires_at = %session.expires_at, "Session issued.");
    ctx_data.write().session = Some(session);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(signin_p);
  tracing::info!("Sign-in pipeline registered.");
}
