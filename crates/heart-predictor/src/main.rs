// heart-predictor/src/main.rs

use heart_predictor::{config::Config, run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cfg = Config::from_env()?;

    tracing::info!("🚀 Starting heart disease prediction service");
    run_server(cfg).await
}
