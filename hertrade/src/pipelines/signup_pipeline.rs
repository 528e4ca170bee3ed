// hertrade/src/pipelines/signup_pipeline.rs

use crate::errors::AppError;
use crate::models::{NewAccount, Role};
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

const MIN_PASSWORD_LEN: usize = 8;

pub fn register_signup_pipeline(flow_registry: &Flow<AppError>) {
  let mut signup_p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("check_existing_account_signup", false, None),
    ("create_account_and_profile", false, None),
  ]);

  signup_p.on_step("validate_signup_input", |ctx_data: ContextData<SignupCtxData>| async move {
    let (email, password_len, name, phone, role) = {
      let guard = ctx_data.read();
      (
        guard.email.trim().to_string(),
        guard.password.len(),
        guard.name.trim().to_string(),
        guard.phone.trim().to_string(),
        guard.role,
      )
    };

    event!(Level::DEBUG, %email, %role, "Validating signup input.");
    if email.is_empty() || !email.contains('@') {
      return Err(AppError::Validation("Valid email is required.".to_string()));
    }
    if password_len < MIN_PASSWORD_LEN {
      warn!(password_len, "Password too short for signup.");
      return Err(AppError::Validation(format!(
        "Password must be at least {} characters long.",
        MIN_PASSWORD_LEN
      )));
    }
    if name.is_empty() {
      return Err(AppError::Validation("Full name is required.".to_string()));
    }
    if phone.is_empty() {
      return Err(AppError::Validation("Phone number is required.".to_string()));
    }
    if role == Role::Admin {
      warn!(%email, "Rejected self-assigned admin role at signup.");
      return Err(AppError::Validation("Role must be 'client' or 'supplier'.".to_string()));
    }

    {
      let mut guard = ctx_data.write();
      guard.email = email;
      guard.name = name;
      guard.phone = phone;
    }
    Ok(PipelineControl::Continue)
  });

  // Gives the friendly message up front. The store's unique index still decides races.
  signup_p.on_step("check_existing_account_signup", |ctx_data: ContextData<SignupCtxData>| async move {
    let (email, store) = {
      let guard = ctx_data.read();
      (guard.email.clone(), guard.app_state.store.clone())
    };

    if store.find_account_by_email(&email).await?.is_some() {
      warn!(%email, "Signup attempted with an existing email.");
      return Err(AppError::Validation("An account with this email already exists.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  signup_p.on_step("create_account_and_profile", |ctx_data: ContextData<SignupCtxData>| async move {
    let (new_account_fields, password, store) = {
      let guard = ctx_data.read();
      (
        (
          guard.email.clone(),
          guard.name.clone(),
          guard.phone.clone(),
          guard.role,
          guard.has_smartphone,
          guard.bio.clone(),
        ),
        guard.password.clone(),
        guard.app_state.store.clone(),
      )
    };
    let (email, name, phone, role, has_smartphone, bio) = new_account_fields;

    let password_hash = auth_service::hash_password(&password)?;
    let profile = store
      .create_account_with_profile(NewAccount {
        email: email.clone(),
        password_hash,
        name,
        phone,
        role,
        has_smartphone,
        bio,
      })
      .await?;

    info!(profile_id = %profile.id, %email, role = %profile.role, "Account and profile created.");
    ctx_data.write().created_profile = Some(profile);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(signup_p);
  tracing::info!("Sign-up pipeline registered.");
}
