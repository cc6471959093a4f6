//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::{pipeline_service::PipelineError, run_service::RunError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Well-formed request that fails validation
    Unprocessable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest(rejection.body_text())
            }
            _ => ApiError::Unprocessable(rejection.body_text()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(id) => ApiError::NotFound(format!("Pipeline {} not found", id)),
            PipelineError::ValidationError(e) => ApiError::Unprocessable(e.to_string()),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NotFound(id) => ApiError::NotFound(format!("Run {} not found", id)),
            RunError::PipelineNotFound(id) => {
                ApiError::NotFound(format!("Pipeline {} not found", id))
            }
            RunError::ValidationError(e) => ApiError::Unprocessable(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_core::error::ValidationError;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Unprocessable("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_service_error_mapping() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ApiError::from(PipelineError::NotFound(id)),
            ApiError::NotFound(msg) if msg == format!("Pipeline {id} not found")
        ));
        assert!(matches!(
            ApiError::from(RunError::ValidationError(ValidationError::NoSteps(id))),
            ApiError::Unprocessable(msg) if msg.contains("has no steps")
        ));
        assert!(matches!(
            ApiError::from(RunError::NotFound(id)),
            ApiError::NotFound(msg) if msg.starts_with("Run ")
        ));
    }
}
