// hertrade/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::store::Store;
use flow::Flow;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flow: Arc<Flow<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state and registers every workflow pipeline.
  pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
    let state = Self {
      store,
      flow: Arc::new(Flow::<AppError>::new()),
      config,
    };
    pipelines::register_all_pipelines(&state.flow);
    state
  }
}
