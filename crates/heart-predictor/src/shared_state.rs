//! Shared state handed to every HTTP handler.
//!
//! Built once at startup and cloned cheaply into handlers; the model
//! registry inside it is the only mutable shared resource.

use std::sync::Arc;

use crate::config::Config;
use crate::model_runtime::ModelRegistry;
use crate::prediction::PredictionService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ModelRegistry>,
    pub predictions: Arc<PredictionService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(ModelRegistry::new(config.models_dir.clone()));
        Self::with_registry(config, registry)
    }

    /// State around an existing registry (custom loaders, tests).
    pub fn with_registry(config: Config, registry: Arc<ModelRegistry>) -> Self {
        let predictions = Arc::new(PredictionService::new(registry.clone()));
        Self {
            config: Arc::new(config),
            registry,
            predictions,
        }
    }
}
