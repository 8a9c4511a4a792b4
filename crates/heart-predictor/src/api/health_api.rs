//! Liveness plus artifact availability. Never loads a model.
use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::metrics;
use crate::model_runtime::ModelId;
use crate::shared_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models: BTreeMap<ModelId, bool>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::inc_request("health", "200");
    Json(HealthResponse {
        status: "ok",
        models: state.registry.artifact_status().await,
    })
}
