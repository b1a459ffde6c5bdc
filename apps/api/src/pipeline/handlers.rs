//! Axum route handlers for the pipeline API.

use anyhow::anyhow;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::documents::extract_text;
use crate::errors::AppError;
use crate::models::resume::ResumeData;
use crate::models::user::CallerIdentity;
use crate::pipeline::orchestrator::{PipelineOutput, PipelineSuccess, UseCase};
use crate::pipeline::prompts::CoverLetterInput;
use crate::pipeline::validator::ValidationReport;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `Json` body whose rejections come back in the `AppError` envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_text: String,
    pub target_role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub resume_text: String,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResponse {
    pub run_id: Uuid,
    pub use_case: UseCase,
    pub owner: CallerIdentity,
    pub result: Value,
    pub validation: ValidationReport,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponse {
    pub run_id: Uuid,
    pub use_case: UseCase,
    pub owner: CallerIdentity,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

fn structured_response(
    owner: CallerIdentity,
    success: PipelineSuccess,
) -> Result<Json<StructuredResponse>, AppError> {
    match success.output {
        PipelineOutput::Structured {
            payload,
            validation,
        } => Ok(Json(StructuredResponse {
            run_id: success.run_id,
            use_case: success.use_case,
            owner,
            result: payload,
            validation,
            generated_at: success.completed_at,
        })),
        PipelineOutput::PlainText(_) => Err(AppError::Internal(anyhow!(
            "{} produced plain text where structured output was expected",
            success.use_case.name()
        ))),
    }
}

fn text_response(
    owner: CallerIdentity,
    success: PipelineSuccess,
) -> Result<Json<TextResponse>, AppError> {
    match success.output {
        PipelineOutput::PlainText(content) => Ok(Json(TextResponse {
            run_id: success.run_id,
            use_case: success.use_case,
            owner,
            content,
            generated_at: success.completed_at,
        })),
        PipelineOutput::Structured { .. } => Err(AppError::Internal(anyhow!(
            "{} produced structured output where plain text was expected",
            success.use_case.name()
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
///
/// Scores a plain-text resume and lists improvements.
pub async fn handle_analyze(
    State(state): State<AppState>,
    owner: CallerIdentity,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<StructuredResponse>, AppError> {
    info!("Resume analysis requested by {owner}");
    let success = state
        .pipeline()
        .analyze_resume(&request.resume_text, request.target_role.as_deref())
        .await?;
    structured_response(owner, success)
}

/// POST /api/v1/analysis/upload
///
/// Multipart form with a `file` part (PDF or plain text) and an optional
/// `targetRole` text part. The extracted text goes through the same analysis
/// pipeline as `/api/v1/analysis`.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    owner: CallerIdentity,
    mut multipart: Multipart,
) -> Result<Json<StructuredResponse>, AppError> {
    let mut upload: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut target_role: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
                upload = Some((file_name, content_type, data));
            }
            Some("targetRole") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read targetRole: {e}")))?;
                target_role = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' part".to_string()))?;
    info!(
        "Resume upload from {owner}: {:?} ({} bytes)",
        file_name,
        data.len()
    );

    // PDF parsing is CPU-bound; keep it off the async executor.
    let resume_text = tokio::task::spawn_blocking(move || {
        extract_text(file_name.as_deref(), content_type.as_deref(), &data)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("spawn_blocking failed in document extraction: {e}")))??;
    let success = state
        .pipeline()
        .analyze_resume(&resume_text, target_role.as_deref())
        .await?;
    structured_response(owner, success)
}

/// POST /api/v1/match
///
/// Compares a resume against a job description.
pub async fn handle_match(
    State(state): State<AppState>,
    owner: CallerIdentity,
    ApiJson(request): ApiJson<MatchRequest>,
) -> Result<Json<StructuredResponse>, AppError> {
    info!("Resume/job match requested by {owner}");
    let success = state
        .pipeline()
        .match_resume(&request.resume_text, &request.job_description)
        .await?;
    structured_response(owner, success)
}

/// POST /api/v1/resumes/build
///
/// Writes a full resume from structured data.
pub async fn handle_build_resume(
    State(state): State<AppState>,
    owner: CallerIdentity,
    ApiJson(data): ApiJson<ResumeData>,
) -> Result<Json<TextResponse>, AppError> {
    info!("Resume build requested by {owner}");
    let success = state.pipeline().build_resume(&data).await?;
    text_response(owner, success)
}

/// POST /api/v1/cover-letters
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    owner: CallerIdentity,
    ApiJson(input): ApiJson<CoverLetterInput>,
) -> Result<Json<TextResponse>, AppError> {
    info!(
        "Cover letter ({:?}) requested by {owner} for {}",
        input.style, input.company_name
    );
    let success = state.pipeline().generate_cover_letter(&input).await?;
    text_response(owner, success)
}
