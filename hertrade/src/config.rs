// hertrade/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  /// Fixed per-cart delivery fee in santim.
  pub delivery_fee_cents: i64,
  pub session_ttl_hours: i64,
  /// When set, the SMS relay only accepts requests carrying this value in the `apikey` header.
  pub sms_relay_secret: Option<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      database_max_connections: 10,
      run_migrations: true,
      delivery_fee_cents: 5000,
      session_ttl_hours: 72,
      sms_relay_secret: None,
    }
  }
}

// Hand-written so the database URL and relay secret never reach the logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("database_max_connections", &self.database_max_connections)
      .field("run_migrations", &self.run_migrations)
      .field("delivery_fee_cents", &self.delivery_fee_cents)
      .field("session_ttl_hours", &self.session_ttl_hours)
      .field("sms_relay_secret", &self.sms_relay_secret.as_ref().map(|_| "[REDACTED]"))
      .finish()
  }
}

fn parse_var<T: FromStr>(var_name: &str, raw: String) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary variable source. `from_env` passes the process
  /// environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = Self::default();
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = match get_env("SERVER_PORT") {
      Some(raw) => parse_var::<u16>("SERVER_PORT", raw)?,
      None => defaults.server_port,
    };
    let store_backend = match get_env("STORE_BACKEND") {
      Some(raw) => raw.parse::<StoreBackend>()?,
      None => defaults.store_backend,
    };
    let database_url = get_env("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let database_max_connections = match get_env("DATABASE_MAX_CONNECTIONS") {
      Some(raw) => parse_var::<u32>("DATABASE_MAX_CONNECTIONS", raw)?,
      None => defaults.database_max_connections,
    };
    let run_migrations = match get_env("RUN_MIGRATIONS") {
      Some(raw) => parse_var::<bool>("RUN_MIGRATIONS", raw)?,
      None => defaults.run_migrations,
    };
    let delivery_fee_cents = match get_env("DELIVERY_FEE_CENTS") {
      Some(raw) => parse_var::<i64>("DELIVERY_FEE_CENTS", raw)?,
      None => defaults.delivery_fee_cents,
    };
    if delivery_fee_cents < 0 {
      return Err(AppError::Config("DELIVERY_FEE_CENTS must not be negative".to_string()));
    }
    let session_ttl_hours = match get_env("SESSION_TTL_HOURS") {
      Some(raw) => parse_var::<i64>("SESSION_TTL_HOURS", raw)?,
      None => defaults.session_ttl_hours,
    };
    if session_ttl_hours <= 0 {
      return Err(AppError::Config("SESSION_TTL_HOURS must be positive".to_string()));
    }
    let sms_relay_secret = get_env("SMS_RELAY_SECRET");

    let config = Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      run_migrations,
      delivery_fee_cents,
      session_ttl_hours,
      sms_relay_secret,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn memory_backend_needs_no_database_url() {
    let cfg = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(cfg.store_backend, StoreBackend::Memory);
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.delivery_fee_cents, 5000);
    assert!(cfg.sms_relay_secret.is_none());
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
  }

  #[test]
  fn rejects_malformed_numbers() {
    let err = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory"), ("SERVER_PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, AppError::Config(msg) if msg.contains("SERVER_PORT")));
  }

  #[test]
  fn debug_output_redacts_secrets() {
    let cfg = AppConfig::from_lookup(lookup_from(&[
      ("DATABASE_URL", "postgres://user:hunter2@db/hertrade"),
      ("SMS_RELAY_SECRET", "relay-secret"),
    ]))
    .unwrap();
    let rendered = format!("{:?}", cfg);
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("relay-secret"));
  }
}
