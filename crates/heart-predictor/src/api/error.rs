use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::model_runtime::RegistryError;
use crate::prediction::PredictionError;
use crate::schema::{FieldError, ValidationError};

/// Error body returned by every route.
#[derive(Debug)]
pub enum ApiError {
    /// 422 with the full field-level violation list.
    Unprocessable(Vec<FieldError>),
    Status { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Status { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match self {
            ApiError::Unprocessable(errors) => (status, Json(json!({ "detail": errors }))).into_response(),
            ApiError::Status { message, .. } => (
                status,
                Json(json!({
                    "detail": message,
                    "code": status.as_u16(),
                })),
            )
                .into_response(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Unprocessable(err.into_errors())
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Registry(RegistryError::UnknownModel(_)) => ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                message: "Unsupported model".to_string(),
            },
            PredictionError::Registry(e @ RegistryError::ArtifactMissing(_))
            | PredictionError::Registry(e @ RegistryError::ArtifactInvalid { .. }) => ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: e.to_string(),
            },
            e @ PredictionError::InferenceFailure(_) => ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: e.to_string(),
            },
        }
    }
}

/// Router fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        message: "Not Found".to_string(),
    }
}

/// Rewrite error responses produced outside the handlers (method mismatch,
/// body limit, timeout) into the `{detail, code}` body the handlers emit.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let message = status.canonical_reason().unwrap_or("Error").to_string();
    let mut rewritten = ApiError::Status { status, message }.into_response();
    rewritten.headers_mut().extend(parts.headers);
    rewritten
}
