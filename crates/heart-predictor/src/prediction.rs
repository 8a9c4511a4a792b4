//! Prediction service: registry lookup, row layout, scoring, response shaping.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::metrics;
use crate::model_runtime::{FeatureFrame, ModelId, ModelRegistry, Predictor, RegistryError};
use crate::schema::HeartRecord;

/// Outcome of scoring one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub model: ModelId,
    pub prediction: i64,
    /// Probability of the positive class (label at index 1).
    pub probability: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
}

pub struct PredictionService {
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Score `record` with the model named `identifier`.
    pub async fn predict(&self, identifier: &str, record: &HeartRecord) -> Result<Prediction, PredictionError> {
        let model: ModelId = identifier.parse()?;
        let predictor = self.registry.load(identifier).await?;
        let frame = FeatureFrame::single_row(record.feature_row());

        let started = Instant::now();
        let (prediction, probability) = tokio::task::spawn_blocking(move || score(predictor.as_ref(), &frame))
            .await
            .map_err(|e| PredictionError::InferenceFailure(format!("scoring task aborted: {}", e)))??;
        metrics::observe_inference(started.elapsed().as_secs_f64());

        debug!("Model {} scored record: class={} p={:.4}", model, prediction, probability);
        Ok(Prediction {
            model,
            prediction,
            probability,
        })
    }
}

/// Run both predictor operations on a one-row frame.
fn score(predictor: &dyn Predictor, frame: &FeatureFrame) -> Result<(i64, f64), PredictionError> {
    let failure = |e: crate::model_runtime::InferenceError| PredictionError::InferenceFailure(e.to_string());

    let probabilities = predictor.predict_proba(frame).map_err(failure)?;
    let probability = probabilities
        .first()
        .map(|p| p[1])
        .ok_or_else(|| PredictionError::InferenceFailure("predictor returned no probabilities".to_string()))?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(PredictionError::InferenceFailure(format!(
            "probability {} is outside [0, 1]",
            probability
        )));
    }

    let prediction = predictor
        .predict(frame)
        .map_err(failure)?
        .first()
        .copied()
        .ok_or_else(|| PredictionError::InferenceFailure("predictor returned no class".to_string()))?;
    let classes = predictor.classes();
    if !classes.contains(&prediction) {
        return Err(PredictionError::InferenceFailure(format!(
            "predicted label {} is not one of the model classes {:?}",
            prediction, classes
        )));
    }

    Ok((prediction, probability))
}
