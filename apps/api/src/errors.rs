use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::documents::DocumentError;
use crate::llm_client::GenerationError;
use crate::pipeline::orchestrator::{PipelineError, PipelineFailure};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// This is the only place HTTP status codes are chosen.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineFailure),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Pipeline(failure) => pipeline_parts(failure),
            AppError::Document(DocumentError::UnsupportedFormat(msg)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_DOCUMENT",
                format!("Unsupported document: {msg}"),
                None,
            ),
            AppError::Document(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DOCUMENT_EXTRACTION_FAILED",
                e.to_string(),
                None,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

fn pipeline_parts(failure: &PipelineFailure) -> (StatusCode, &'static str, String, Option<Value>) {
    let stage = json!({ "stage": failure.stage });
    match &failure.reason {
        PipelineError::EmptyDocument(label) => (
            StatusCode::BAD_REQUEST,
            "EMPTY_DOCUMENT",
            format!("The {label} is empty. Provide some content and try again."),
            None,
        ),
        PipelineError::Generation(GenerationError::Configuration(msg)) => {
            tracing::error!("Generation service misconfigured: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                "The AI service is not configured correctly on the server".to_string(),
                None,
            )
        }
        PipelineError::Generation(GenerationError::RateLimited(msg)) => {
            tracing::warn!("Generation service rate limited: {msg}");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "The AI service is busy. Please retry in a moment.".to_string(),
                None,
            )
        }
        PipelineError::Generation(GenerationError::UpstreamServer { status, message }) => {
            tracing::error!("Generation service error {status}: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
                "The AI service failed to process the request".to_string(),
                None,
            )
        }
        PipelineError::Generation(GenerationError::EmptyResponse)
        | PipelineError::EmptyGeneratedContent => {
            tracing::error!("Generation produced no content at {:?}", failure.stage);
            (
                StatusCode::BAD_GATEWAY,
                "EMPTY_GENERATION",
                "The AI service returned no content".to_string(),
                Some(stage),
            )
        }
        PipelineError::MalformedStructuredResponse { reason, .. } => {
            tracing::error!("Malformed model response: {reason}");
            (
                StatusCode::BAD_GATEWAY,
                "MALFORMED_AI_RESPONSE",
                "The AI service returned a response that could not be parsed".to_string(),
                Some(json!({ "stage": failure.stage, "rawResponse": failure.reason.raw_text() })),
            )
        }
        PipelineError::Generation(GenerationError::Unknown(msg)) => {
            tracing::error!("Generation failed: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                None,
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orchestrator::PipelineStage;

    fn failure(stage: PipelineStage, reason: PipelineError) -> AppError {
        AppError::Pipeline(PipelineFailure { stage, reason })
    }

    fn status_and_code(error: AppError) -> (StatusCode, &'static str) {
        let (status, code, _, _) = error.parts();
        (status, code)
    }

    #[test]
    fn test_generation_classes_map_to_distinct_codes() {
        let cases = [
            (
                GenerationError::Configuration("no key".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
            (
                GenerationError::RateLimited("quota".to_string()),
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
            ),
            (
                GenerationError::UpstreamServer {
                    status: 500,
                    message: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
            ),
            (
                GenerationError::EmptyResponse,
                StatusCode::BAD_GATEWAY,
                "EMPTY_GENERATION",
            ),
            (
                GenerationError::Unknown("?".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (error, status, code) in cases {
            let app_error = failure(PipelineStage::AwaitingGeneration, error.into());
            assert_eq!(status_and_code(app_error), (status, code));
        }
    }

    #[test]
    fn test_malformed_response_carries_raw_text() {
        let error = failure(
            PipelineStage::Extracting,
            PipelineError::MalformedStructuredResponse {
                raw: "not json".to_string(),
                reason: "no object".to_string(),
            },
        );
        let (status, code, _, details) = error.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "MALFORMED_AI_RESPONSE");
        let details = details.unwrap();
        assert_eq!(details["rawResponse"], "not json");
        assert_eq!(details["stage"], "extracting");
    }

    #[test]
    fn test_empty_document_is_bad_request() {
        let error = failure(PipelineStage::Idle, PipelineError::EmptyDocument("resume text"));
        assert_eq!(
            status_and_code(error),
            (StatusCode::BAD_REQUEST, "EMPTY_DOCUMENT")
        );
    }

    #[test]
    fn test_document_errors_keep_their_classification() {
        assert_eq!(
            status_and_code(AppError::Document(DocumentError::UnsupportedFormat(
                "x.png".to_string()
            ))),
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_DOCUMENT")
        );
        assert_eq!(
            status_and_code(AppError::Document(DocumentError::InvalidEncoding)),
            (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_EXTRACTION_FAILED")
        );
    }
}
