// hertrade/src/web/extractors.rs

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;

/// The caller behind a bearer session token, resolved once per request.
#[derive(Debug, Clone)]
pub struct AuthenticatedProfile {
  pub profile_id: Uuid,
  pub role: Role,
  pub has_smartphone: bool,
  pub is_verified: bool,
  pub name: String,
}

impl AuthenticatedProfile {
  pub fn require_role(&self, role: Role) -> Result<(), AppError> {
    if self.role != role {
      warn!(profile_id = %self.profile_id, actual = %self.role, required = %role, "Role check failed.");
      return Err(AppError::Forbidden(format!("This action requires the '{}' role.", role)));
    }
    Ok(())
  }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedProfile {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let app_state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
      let app_state =
        app_state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let token = token.ok_or_else(|| {
        warn!("Request without a bearer token.");
        AppError::Auth("Authentication required.".to_string())
      })?;

      let session = app_state
        .store
        .find_session(&token)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid or expired session.".to_string()))?;
      if session.is_expired_at(Utc::now()) {
        warn!(profile_id = %session.profile_id, "Expired session token presented.");
        return Err(AppError::Auth("Invalid or expired session.".to_string()));
      }

      let profile = app_state
        .store
        .find_profile(session.profile_id)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid or expired session.".to_string()))?;

      Ok(AuthenticatedProfile {
        profile_id: profile.id,
        role: profile.role,
        has_smartphone: profile.has_smartphone,
        is_verified: profile.is_verified,
        name: profile.name,
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  fn caller(role: Role) -> AuthenticatedProfile {
    AuthenticatedProfile {
      profile_id: Uuid::new_v4(),
      role,
      has_smartphone: true,
      is_verified: false,
      name: "Hana".to_string(),
    }
  }

  #[test]
  fn bearer_token_requires_prefix_and_value() {
    let req = TestRequest::default()
      .insert_header((header::AUTHORIZATION, "Bearer abc123"))
      .to_http_request();
    assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));

    let req = TestRequest::default()
      .insert_header((header::AUTHORIZATION, "Basic abc123"))
      .to_http_request();
    assert_eq!(bearer_token(&req), None);

    let req = TestRequest::default()
      .insert_header((header::AUTHORIZATION, "Bearer   "))
      .to_http_request();
    assert_eq!(bearer_token(&req), None);

    assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
  }

  #[test]
  fn require_role_rejects_other_roles() {
    assert!(caller(Role::Supplier).require_role(Role::Supplier).is_ok());
    assert!(matches!(
      caller(Role::Client).require_role(Role::Supplier),
      Err(AppError::Forbidden(_))
    ));
  }
}
