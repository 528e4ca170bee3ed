// hertrade/src/models/account.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Login identity. The marketplace-facing record is the linked [`super::Profile`].
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
  pub id: Uuid,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at: DateTime<Utc>,
}

/// Opaque bearer session issued at sign-in.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
  pub token: String,
  pub profile_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }
}
