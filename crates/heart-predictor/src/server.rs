//! HTTP server startup.
//!
//! Builds the shared state once, wires the routes onto it and serves until
//! the process is stopped. Handlers reach the model registry through the
//! state; no model is loaded until the first prediction asks for it.

use std::time::Duration;
use tracing::{info, warn};

use crate::{config::Config, shared_state::AppState};

/// Run the prediction server
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::metrics::init_metrics();
    cfg.print_config();

    let state = AppState::new(cfg.clone());

    for (model, present) in state.registry.artifact_status().await {
        if present {
            info!("Artifact for '{}' found at {}", model, state.registry.artifact_path(model).display());
        } else {
            warn!(
                "⚠️  Artifact for '{}' missing at {}; predictions with it will fail",
                model,
                state.registry.artifact_path(model).display()
            );
        }
    }

    let addr = cfg.api_addr()?;
    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = build_router(state);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{
        middleware,
        Router,
        routing::{get, post},
    };
    use tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
        timeout::TimeoutLayer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = Duration::from_secs(state.config.request_timeout_seconds);

    Router::new()
        .route("/", get(crate::api::info_api::root))
        .route("/health", get(crate::api::health_api::health))
        .route("/predict/:model_name", post(crate::api::predict_api::predict))
        .route("/metrics", get(crate::metrics::get_metrics))
        .fallback(crate::api::error::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(crate::api::error::json_error_body))
        .with_state(state)
}
