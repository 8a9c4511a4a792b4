#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use heart_predictor::{build_router, AppState, Config, ModelRegistry};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const LOG_REG_ARTIFACT: &str = include_str!("../../../../models/log_reg_pipeline.json");
pub const DECISION_TREE_ARTIFACT: &str = include_str!("../../../../models/decision_tree_pipeline.json");

/// Temporary models directory holding both shipped artifacts.
pub fn artifact_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_artifacts(dir.path());
    dir
}

pub fn write_artifacts(dir: &Path) {
    std::fs::write(dir.join("log_reg_pipeline.json"), LOG_REG_ARTIFACT).expect("write log_reg");
    std::fs::write(dir.join("decision_tree_pipeline.json"), DECISION_TREE_ARTIFACT).expect("write decision_tree");
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        models_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

pub fn app(dir: &Path) -> (Router, Arc<ModelRegistry>) {
    let registry = Arc::new(ModelRegistry::new(dir));
    app_with_registry(dir, registry)
}

pub fn app_with_registry(dir: &Path, registry: Arc<ModelRegistry>) -> (Router, Arc<ModelRegistry>) {
    let state = AppState::with_registry(test_config(dir), registry.clone());
    (build_router(state), registry)
}

pub fn valid_payload() -> Value {
    heart_predictor::api::example_payload()
}

pub fn with_field(field: &str, value: Value) -> Value {
    let mut body = valid_payload();
    body[field] = value;
    body
}

pub fn without_field(field: &str) -> Value {
    let mut body = valid_payload();
    body.as_object_mut().expect("object").remove(field);
    body
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

/// Send one request and decode the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Field names listed in a 422 `detail` array.
pub fn violated_fields(body: &Value) -> Vec<String> {
    body["detail"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["loc"][1].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
