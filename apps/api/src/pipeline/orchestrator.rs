//! Pipeline orchestration: runs one use case end to end.
//!
//! Flow (strictly sequential, one request at a time):
//!   Idle → BuildingPrompt → AwaitingGeneration → Extracting → Validating → done
//!
//! Every failure leaves with the stage it happened in and a classified reason.
//! Nothing here is persisted; callers own storage of the returned payload.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::{
    uniform_safety_settings, GenerationError, GenerationRequest, HarmBlockThreshold,
    TextGenerator,
};
use crate::models::resume::{InputDocument, ResumeData};
use crate::pipeline::extractor::{self, ExtractedPayload, ExtractionError, ExtractionMode};
use crate::pipeline::prompts::{
    build_analysis_prompt, build_cover_letter_prompt, build_match_prompt, build_resume_prompt,
    CoverLetterInput,
};
use crate::pipeline::validator::{
    self, AnalysisResult, MatchResult, PayloadKind, ValidationReport,
};

// ────────────────────────────────────────────────────────────────────────────
// Use cases
// ────────────────────────────────────────────────────────────────────────────

/// Lower temperature keeps JSON schemas stable; free text tolerates more.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;
pub const MATCH_TEMPERATURE: f32 = 0.3;
pub const RESUME_TEMPERATURE: f32 = 0.5;
pub const COVER_LETTER_TEMPERATURE: f32 = 0.6;

const SAMPLING_TOP_K: u32 = 40;
const SAMPLING_TOP_P: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    Analysis,
    Match,
    ResumeBuild,
    CoverLetter,
}

impl UseCase {
    pub fn name(&self) -> &'static str {
        match self {
            UseCase::Analysis => "analysis",
            UseCase::Match => "match",
            UseCase::ResumeBuild => "resume_build",
            UseCase::CoverLetter => "cover_letter",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            UseCase::Analysis => ANALYSIS_TEMPERATURE,
            UseCase::Match => MATCH_TEMPERATURE,
            UseCase::ResumeBuild => RESUME_TEMPERATURE,
            UseCase::CoverLetter => COVER_LETTER_TEMPERATURE,
        }
    }

    fn max_output_tokens(&self) -> u32 {
        match self {
            UseCase::ResumeBuild => 4096,
            _ => 2048,
        }
    }

    /// Validation rules for structured use cases; `None` for free text.
    pub fn payload_kind(&self) -> Option<PayloadKind> {
        match self {
            UseCase::Analysis => Some(PayloadKind::Analysis),
            UseCase::Match => Some(PayloadKind::Match),
            UseCase::ResumeBuild | UseCase::CoverLetter => None,
        }
    }

    pub fn extraction_mode(&self) -> ExtractionMode {
        match self.payload_kind() {
            Some(_) => ExtractionMode::Structured,
            None => ExtractionMode::PlainText,
        }
    }

    pub fn generation_request(&self, prompt: String) -> GenerationRequest {
        let request = GenerationRequest::new(prompt, self.temperature())
            .with_max_output_tokens(self.max_output_tokens())
            .with_safety_settings(uniform_safety_settings(
                HarmBlockThreshold::BlockMediumAndAbove,
            ));
        match self.extraction_mode() {
            ExtractionMode::PlainText => request.with_sampling(SAMPLING_TOP_K, SAMPLING_TOP_P),
            ExtractionMode::Structured => request,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    BuildingPrompt,
    AwaitingGeneration,
    Extracting,
    Validating,
}

/// Classified reason a pipeline run failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("The {0} is empty")]
    EmptyDocument(&'static str),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("The model produced no usable text")]
    EmptyGeneratedContent,

    #[error("The model response could not be read as structured data: {reason}")]
    MalformedStructuredResponse { raw: String, reason: String },
}

impl PipelineError {
    /// Raw model output, when the failure happened after generation.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            PipelineError::MalformedStructuredResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(error: ExtractionError) -> Self {
        let reason = error.to_string();
        match error {
            ExtractionError::MalformedStructuredResponse { raw } => {
                PipelineError::MalformedStructuredResponse { raw, reason }
            }
            ExtractionError::EmptyGeneratedContent => PipelineError::EmptyGeneratedContent,
        }
    }
}

/// Terminal `Failed` state: where the run stopped and why.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub reason: PipelineError,
}

impl PipelineFailure {
    fn at(stage: PipelineStage, reason: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    Structured {
        payload: Value,
        validation: ValidationReport,
    },
    PlainText(String),
}

/// Terminal `Succeeded` state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSuccess {
    pub run_id: Uuid,
    pub use_case: UseCase,
    pub output: PipelineOutput,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
impl PipelineSuccess {
    pub fn payload(&self) -> Option<&Value> {
        match &self.output {
            PipelineOutput::Structured { payload, .. } => Some(payload),
            PipelineOutput::PlainText(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.output {
            PipelineOutput::PlainText(text) => Some(text),
            PipelineOutput::Structured { .. } => None,
        }
    }
}

pub type PipelineResult = Result<PipelineSuccess, PipelineFailure>;

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Bounded retry applied only to `RateLimited` generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: base, 2×base, 4×base, …
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Borrowed view of the shared generator plus retry policy. Cheap to build
/// per request; holds no state of its own.
pub struct Pipeline<'a> {
    generator: &'a dyn TextGenerator,
    retry: RetryPolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(generator: &'a dyn TextGenerator, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    pub async fn analyze_resume(&self, resume_text: &str, target_role: Option<&str>) -> PipelineResult {
        self.run(
            UseCase::Analysis,
            &[InputDocument::ResumeFreeText(resume_text)],
            || build_analysis_prompt(resume_text, target_role),
        )
        .await
    }

    pub async fn match_resume(&self, resume_text: &str, job_description: &str) -> PipelineResult {
        self.run(
            UseCase::Match,
            &[
                InputDocument::ResumeFreeText(resume_text),
                InputDocument::JobDescriptionText(job_description),
            ],
            || build_match_prompt(resume_text, job_description),
        )
        .await
    }

    pub async fn build_resume(&self, data: &ResumeData) -> PipelineResult {
        self.run(
            UseCase::ResumeBuild,
            &[InputDocument::ResumeStructured(data)],
            || build_resume_prompt(data),
        )
        .await
    }

    pub async fn generate_cover_letter(&self, input: &CoverLetterInput) -> PipelineResult {
        self.run(
            UseCase::CoverLetter,
            &[
                InputDocument::ResumeFreeText(&input.resume_text),
                InputDocument::JobDescriptionText(&input.job_description),
            ],
            || build_cover_letter_prompt(input),
        )
        .await
    }

    async fn run<F>(
        &self,
        use_case: UseCase,
        documents: &[InputDocument<'_>],
        build_prompt: F,
    ) -> PipelineResult
    where
        F: FnOnce() -> String,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, use_case = use_case.name());
        self.execute(run_id, use_case, documents, build_prompt)
            .instrument(span)
            .await
    }

    async fn execute<F>(
        &self,
        run_id: Uuid,
        use_case: UseCase,
        documents: &[InputDocument<'_>],
        build_prompt: F,
    ) -> PipelineResult
    where
        F: FnOnce() -> String,
    {
        // Idle: nothing is built or sent for an empty document.
        if let Some(empty) = documents.iter().find(|d| d.is_empty()) {
            warn!("Rejecting {} request: {} is empty", use_case.name(), empty.label());
            return Err(PipelineFailure::at(
                PipelineStage::Idle,
                PipelineError::EmptyDocument(empty.label()),
            ));
        }

        info!("Stage {:?}", PipelineStage::BuildingPrompt);
        let request = use_case.generation_request(build_prompt());

        info!(
            "Stage {:?} (model={}, temperature={})",
            PipelineStage::AwaitingGeneration,
            self.generator.model(),
            request.temperature
        );
        let raw = self
            .generate_with_retry(&request)
            .await
            .map_err(|e| PipelineFailure::at(PipelineStage::AwaitingGeneration, e))?;

        info!("Stage {:?} ({} chars)", PipelineStage::Extracting, raw.len());
        let extracted = extractor::extract(&raw, use_case.extraction_mode()).map_err(|e| {
            if let Some(raw) = e.raw_text() {
                warn!("Unreadable model output ({} chars): {e}", raw.len());
            }
            PipelineFailure::at(PipelineStage::Extracting, e)
        })?;

        info!("Stage {:?}", PipelineStage::Validating);
        let output = match extracted {
            ExtractedPayload::PlainText(text) => PipelineOutput::PlainText(text),
            ExtractedPayload::Structured(payload) => {
                let validation = match use_case.payload_kind() {
                    Some(kind) => validator::validate(&payload, kind).map_err(|e| {
                        PipelineFailure::at(
                            PipelineStage::Validating,
                            PipelineError::MalformedStructuredResponse {
                                raw: raw.clone(),
                                reason: e.to_string(),
                            },
                        )
                    })?,
                    None => ValidationReport {
                        complete: true,
                        ..Default::default()
                    },
                };
                if !validation.complete {
                    warn!(
                        "Incomplete {} payload, missing {:?}; returning it as-is",
                        use_case.name(),
                        validation.missing_fields
                    );
                }
                log_structured_summary(use_case, &payload);
                PipelineOutput::Structured {
                    payload,
                    validation,
                }
            }
        };

        info!("Pipeline {} succeeded", use_case.name());
        Ok(PipelineSuccess {
            run_id,
            use_case,
            output,
            completed_at: Utc::now(),
        })
    }

    /// One generation call, repeated only for `RateLimited` and only up to
    /// `retry.max_retries` extra attempts.
    async fn generate_with_retry(
        &self,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.generator.generate(request).await {
                Err(GenerationError::RateLimited(message)) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Generation rate limited ({message}); retry {}/{} after {}ms",
                        attempt,
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}

fn log_structured_summary(use_case: UseCase, payload: &Value) {
    match use_case {
        UseCase::Analysis => {
            let view = AnalysisResult::from_payload(payload);
            info!(
                "Analysis overall_score={} across {} categories",
                view.overall_score,
                view.category_scores.len()
            );
        }
        UseCase::Match => {
            let view = MatchResult::from_payload(payload);
            info!(
                "Match score={} (matching={}, missing={})",
                view.match_score,
                view.matching_keywords.len(),
                view.missing_keywords.len()
            );
        }
        UseCase::ResumeBuild | UseCase::CoverLetter => {}
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
