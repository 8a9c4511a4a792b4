// Static service description served at the root path.
use axum::Json;
use serde_json::{json, Value};

use crate::metrics;
use crate::model_runtime::ModelId;

/// A record that passes validation, shown to API consumers.
pub fn example_payload() -> Value {
    json!({
        "Age": 54,
        "Sex": "M",
        "ChestPainType": "ASY",
        "RestingBP": 140,
        "Cholesterol": 239,
        "FastingBS": 0,
        "RestingECG": "Normal",
        "MaxHR": 160,
        "ExerciseAngina": "N",
        "Oldpeak": 1.2,
        "ST_Slope": "Flat"
    })
}

/// GET /
pub async fn root() -> Json<Value> {
    metrics::inc_request("root", "200");
    let models: Vec<&str> = ModelId::ALL.iter().map(ModelId::as_str).collect();
    Json(json!({
        "message": "Heart Disease Prediction API",
        "models": models,
        "example_payload": example_payload(),
    }))
}
