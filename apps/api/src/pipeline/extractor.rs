//! Response extraction: recovers a usable payload from raw model output.
//!
//! Structured mode tries, in order:
//! 1. the first fenced block labeled `json`
//! 2. the substring from the first `{` to the last `}` (greedy, no balancing)
//!
//! Nothing is repaired. If neither candidate decodes, the raw text is handed
//! back inside the error for diagnosis.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("JSON fence pattern is valid")
});

static WHOLE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)\r?\n?```\z")
        .expect("whole-fence pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Model response did not contain a decodable JSON object")]
    MalformedStructuredResponse { raw: String },

    #[error("Model response was empty after trimming")]
    EmptyGeneratedContent,
}

impl ExtractionError {
    /// The raw model output, when the failure kept it.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ExtractionError::MalformedStructuredResponse { raw } => Some(raw),
            ExtractionError::EmptyGeneratedContent => None,
        }
    }
}

/// What a pipeline expects back from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    Structured,
    PlainText,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedPayload {
    Structured(Value),
    PlainText(String),
}

/// Which step of the structured search produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    FencedBlock,
    BraceScan,
}

pub fn extract(raw: &str, mode: ExtractionMode) -> Result<ExtractedPayload, ExtractionError> {
    match mode {
        ExtractionMode::Structured => extract_json(raw).map(ExtractedPayload::Structured),
        ExtractionMode::PlainText => extract_plain_text(raw).map(ExtractedPayload::PlainText),
    }
}

pub fn extract_json(raw: &str) -> Result<Value, ExtractionError> {
    let (value, strategy) = locate_json(raw).ok_or_else(|| {
        ExtractionError::MalformedStructuredResponse {
            raw: raw.to_string(),
        }
    })?;
    debug!("Extracted structured payload via {strategy:?}");
    Ok(value)
}

fn locate_json(raw: &str) -> Option<(Value, ExtractionStrategy)> {
    if let Some(interior) = JSON_FENCE.captures(raw).and_then(|c| c.get(1)) {
        match serde_json::from_str::<Value>(interior.as_str().trim()) {
            Ok(value) => return Some((value, ExtractionStrategy::FencedBlock)),
            Err(e) => debug!("Labeled JSON fence did not decode ({e}); trying brace scan"),
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&raw[start..=end])
        .ok()
        .map(|value| (value, ExtractionStrategy::BraceScan))
}

pub fn extract_plain_text(raw: &str) -> Result<String, ExtractionError> {
    let trimmed = raw.trim();
    let text = match WHOLE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(interior) if !interior.as_str().contains("```") => interior.as_str().trim(),
        _ => trimmed,
    };

    if text.is_empty() {
        return Err(ExtractionError::EmptyGeneratedContent);
    }
    Ok(text.to_string())
}
