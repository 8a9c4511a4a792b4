// Prediction endpoint: path + body validation, then dispatch to the service.
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use tracing::{error, info};

use super::error::ApiError;
use crate::metrics;
use crate::model_runtime::ModelId;
use crate::prediction::Prediction;
use crate::schema::{FieldError, HeartRecord, ViolationKind};
use crate::shared_state::AppState;

/// The route only admits known identifiers; anything else is a schema error.
fn parse_model_name(raw: &str) -> Result<ModelId, FieldError> {
    raw.parse().map_err(|_| {
        let permitted = ModelId::ALL
            .iter()
            .map(|m| format!("'{}'", m.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        FieldError::path(
            "model_name",
            ViolationKind::LiteralError,
            format!("unexpected value; permitted: {}", permitted),
        )
    })
}

/// POST /predict/:model_name
///
/// Path and body are both validated before anything else runs; their
/// violations are reported together in one 422 response.
pub async fn predict(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
    body: Bytes,
) -> Result<Json<Prediction>, ApiError> {
    let (model, record) = match (parse_model_name(&model_name), HeartRecord::from_slice(&body)) {
        (Ok(model), Ok(record)) => (model, record),
        (model, record) => {
            let mut errors = Vec::new();
            if let Err(e) = model {
                errors.push(e);
            }
            if let Err(e) = record {
                errors.extend(e.into_errors());
            }
            info!("Rejected prediction request for '{}': {} violation(s)", model_name, errors.len());
            metrics::inc_request("predict", "422");
            return Err(ApiError::Unprocessable(errors));
        }
    };

    match state.predictions.predict(model.as_str(), &record).await {
        Ok(prediction) => {
            info!(
                "Prediction with {}: class={} probability={:.4}",
                model, prediction.prediction, prediction.probability
            );
            metrics::inc_request("predict", "200");
            Ok(Json(prediction))
        }
        Err(e) => {
            error!("Prediction with {} failed: {}", model, e);
            let err = ApiError::from(e);
            metrics::inc_request("predict", err.status().as_str());
            Err(err)
        }
    }
}
