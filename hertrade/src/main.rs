// hertrade/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use hertrade::config::{AppConfig, StoreBackend};
use hertrade::state::AppState;
use hertrade::store::{MemoryStore, PgStore, Store};
use hertrade::web::configure_app_routes;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  // LOG_FORMAT=json for log shippers; human-readable otherwise.
  if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let store = PgStore::connect(config).await.context("connecting to Postgres")?;
      if config.run_migrations {
        store.run_migrations().await.context("running migrations")?;
      }
      Ok(Arc::new(store))
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();
  tracing::info!("Starting HerTrade server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  tracing::info!(config = ?app_config, "Configuration loaded.");

  let store = build_store(&app_config).await?;
  let app_state = AppState::new(store, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  Ok(())
}
