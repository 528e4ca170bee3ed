// hertrade/src/models/profile.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "profile_role_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Client,
  Supplier,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Client => "client",
      Role::Supplier => "supplier",
      Role::Admin => "admin",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
  pub id: Uuid,
  #[serde(skip_serializing)]
  pub account_id: Uuid,
  pub name: String,
  pub phone: String,
  pub role: Role,
  pub is_verified: bool,
  pub has_smartphone: bool,
  pub bio: Option<String>,
  pub avatar_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Everything needed to create an account and its profile in one write.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email: String,
  pub password_hash: String,
  pub name: String,
  pub phone: String,
  pub role: Role,
  pub has_smartphone: bool,
  pub bio: Option<String>,
}
