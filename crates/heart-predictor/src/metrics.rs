
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Registry, TextEncoder};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;
use tracing::warn;
lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static MODEL_LOADS: OnceLock<IntCounterVec> = OnceLock::new();
static INFERENCE_TIME: OnceLock<Histogram> = OnceLock::new();

fn register<M: Collector + Clone + 'static>(cell: &OnceLock<M>, metric: prometheus::Result<M>) {
    match metric {
        Ok(metric) => {
            if cell.set(metric.clone()).is_ok() {
                REGISTRY.register(Box::new(metric)).ok();
            }
        }
        Err(e) => warn!("Failed to create metric: {}", e),
    }
}

pub fn init_metrics() {
    register(
        &REQ_COUNTER,
        IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"],
        ),
    );
    register(
        &MODEL_LOADS,
        IntCounterVec::new(
            prometheus::opts!("model_loads_total", "Model artifacts deserialized"),
            &["model"],
        ),
    );
    register(
        &INFERENCE_TIME,
        Histogram::with_opts(HistogramOpts::new(
            "inference_duration_seconds",
            "Time spent scoring a single record",
        )),
    );
}
pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}
pub fn inc_model_load(model: &str) {
    if let Some(counter) = MODEL_LOADS.get() {
        counter.with_label_values(&[model]).inc();
    }
}
pub fn observe_inference(seconds: f64) {
    if let Some(histogram) = INFERENCE_TIME.get() {
        histogram.observe(seconds);
    }
}
pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("failed to encode metrics: {}", e).into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
