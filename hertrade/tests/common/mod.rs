// tests/common/mod.rs
#![allow(dead_code)]

use hertrade::config::{AppConfig, StoreBackend};
use hertrade::models::{NewAccount, NewProduct, Product, Profile, Role};
use hertrade::services::auth_service;
use hertrade::state::AppState;
use hertrade::store::{MemoryStore, Store};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const DELIVERY_FEE_CENTS: i64 = 5000;

/// Hashing is deliberately slow, so every seeded account shares one hash.
static PASSWORD_HASH: Lazy<String> =
  Lazy::new(|| auth_service::hash_password(TEST_PASSWORD).expect("hashing test password"));

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_config() -> AppConfig {
  AppConfig {
    store_backend: StoreBackend::Memory,
    delivery_fee_cents: DELIVERY_FEE_CENTS,
    ..AppConfig::default()
  }
}

pub struct TestApp {
  pub store: Arc<MemoryStore>,
  pub state: AppState,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with_config(test_config())
  }

  pub fn with_config(config: AppConfig) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), Arc::new(config));
    Self { store, state }
  }

  pub async fn seed_profile(&self, role: Role, phone: &str, has_smartphone: bool) -> Profile {
    let email = format!("{}-{}@hertrade.test", role, Uuid::new_v4().simple());
    self
      .store
      .create_account_with_profile(NewAccount {
        email,
        password_hash: PASSWORD_HASH.clone(),
        name: format!("Test {}", role),
        phone: phone.to_string(),
        role,
        has_smartphone,
        bio: None,
      })
      .await
      .expect("seeding profile")
  }

  pub async fn seed_client(&self) -> Profile {
    self.seed_profile(Role::Client, "+251911000001", true).await
  }

  /// A supplier without a smartphone, reachable through the SMS relay.
  pub async fn seed_sms_supplier(&self, phone: &str) -> Profile {
    self.seed_profile(Role::Supplier, phone, false).await
  }

  pub async fn seed_product(&self, supplier_id: Uuid, name: &str, price_cents: i64) -> Product {
    self
      .store
      .insert_product(NewProduct {
        supplier_id,
        name: name.to_string(),
        description: None,
        price_cents,
        stock: 10,
        category: "Crafts".to_string(),
        image: None,
      })
      .await
      .expect("seeding product")
  }

  /// Issues a session directly and returns the bearer token.
  pub async fn token_for(&self, profile: &Profile) -> String {
    let session = auth_service::new_session(profile.id, 1);
    let token = session.token.clone();
    self.store.insert_session(session).await.expect("seeding session");
    token
  }
}
