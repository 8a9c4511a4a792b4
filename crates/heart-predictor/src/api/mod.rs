//! API module - HTTP handlers over the prediction service

pub mod error;
pub mod health_api;
pub mod info_api;
pub mod predict_api;

pub use error::ApiError;
pub use health_api::{health, HealthResponse};
pub use info_api::{example_payload, root};
pub use predict_api::predict;
