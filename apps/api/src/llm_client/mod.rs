//! LLM Client: the single point of entry for all generation-service calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All LLM interactions MUST go through this module, and callers depend on the
//! `TextGenerator` trait rather than on `GenerationClient` itself.
//!
//! One call per invocation. This client never retries; retry policy belongs to
//! the pipeline orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub mod testing;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Classified outcome of a failed generation call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Generation service is misconfigured: {0}")]
    Configuration(String),

    #[error("Generation service rate limit reached: {0}")]
    RateLimited(String),

    #[error("Generation service failed (status {status}): {message}")]
    UpstreamServer { status: u16, message: String },

    #[error("Generation service returned an empty response")]
    EmptyResponse,

    #[error("Generation call failed: {0}")]
    Unknown(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Request model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// Only the threshold the pipelines send is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Applies the same threshold to every harm category.
pub fn uniform_safety_settings(threshold: HarmBlockThreshold) -> Vec<SafetySetting> {
    [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold,
    })
    .collect()
}

/// Everything needed for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub safety_settings: Option<Vec<SafetySetting>>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_output_tokens: None,
            top_k: None,
            top_p: None,
            safety_settings: None,
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_sampling(mut self, top_k: u32, top_p: f32) -> Self {
        self.top_k = Some(top_k);
        self.top_p = Some(top_p);
        self
    }

    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = Some(settings);
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<&'a [SafetySetting]>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl<'a> GeminiRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                top_k: request.top_k,
                top_p: request.top_p,
                max_output_tokens: request.max_output_tokens,
            },
            safety_settings: request.safety_settings.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        Some(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Maps a non-success HTTP response onto the failure taxonomy.
///
/// Gemini reports a bad key as 400 INVALID_ARGUMENT, so the message is inspected
/// as well as the status code.
pub fn classify_failure(status: u16, body: &str) -> GenerationError {
    let (message, api_status) = match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.to_string(), None),
    };
    let api_status = api_status.unwrap_or_default();
    let lowered = message.to_lowercase();

    if status == 401
        || status == 403
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED"
        || (status == 400 && lowered.contains("api key"))
    {
        GenerationError::Configuration(message)
    } else if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        GenerationError::RateLimited(message)
    } else if (500..=599).contains(&status) {
        GenerationError::UpstreamServer { status, message }
    } else {
        GenerationError::Unknown(format!("HTTP {status}: {message}"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Anything that can turn a `GenerationRequest` into raw text.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so orchestrators can run
/// against a scripted generator in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Identifier of the model behind this generator, for logging.
    fn model(&self) -> &str;
}

/// The single Gemini client, constructed once at startup and shared read-only.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GenerationClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::Configuration("GEMINI_API_KEY is not set".to_string())
        })?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&GeminiRequest::from_request(request))
            .send()
            .await
            .map_err(|e| GenerationError::Unknown(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Unknown(format!("undecodable response body: {e}")))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            warn!("Gemini blocked the prompt: {reason}");
        }

        let text = parsed.text().unwrap_or_default();
        if text.trim().is_empty() {
            let finish_reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!("Gemini returned no text (finish_reason={finish_reason})");
            return Err(GenerationError::EmptyResponse);
        }

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
