// heart-predictor/src/lib.rs

pub mod api;
pub mod config;
pub mod metrics;
pub mod model_runtime;
pub mod prediction;
pub mod schema;
pub mod server;
pub mod shared_state;
pub mod telemetry;

// Public API exports
pub use config::Config;
pub use model_runtime::{ModelId, ModelRegistry, Predictor, RegistryError};
pub use prediction::{Prediction, PredictionError, PredictionService};
pub use schema::{HeartRecord, ValidationError};
pub use server::{build_router, run_server};
pub use shared_state::AppState;
