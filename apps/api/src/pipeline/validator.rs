//! Result validation: best-effort shape checks on extracted JSON.
//!
//! Validation never mutates or drops the payload. A payload missing required
//! keys is still usable; the report says which keys were absent and the typed
//! views below read them as 0 / empty.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Structured payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Which rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Analysis,
    Match,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True when every required key was present with the expected type.
    pub complete: bool,
    pub missing_fields: Vec<&'static str>,
    /// Optional list keys that were absent and read as empty.
    pub defaulted_fields: Vec<&'static str>,
}

const MATCH_LIST_FIELDS: [&str; 3] = ["missingKeywords", "matchingKeywords", "suggestions"];

pub fn validate(payload: &Value, kind: PayloadKind) -> Result<ValidationReport, ValidationError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ValidationError::NotAnObject(json_type_name(payload)))?;

    let mut missing_fields = Vec::new();
    let mut defaulted_fields = Vec::new();

    match kind {
        PayloadKind::Analysis => {
            if !object.get("overallScore").is_some_and(Value::is_number) {
                missing_fields.push("overallScore");
            }
            if !object.get("categoryScores").is_some_and(Value::is_object) {
                missing_fields.push("categoryScores");
            }
        }
        PayloadKind::Match => {
            if !object.get("matchScore").is_some_and(Value::is_number) {
                missing_fields.push("matchScore");
            }
            for field in MATCH_LIST_FIELDS {
                if !object.get(field).is_some_and(Value::is_array) {
                    defaulted_fields.push(field);
                }
            }
        }
    }

    Ok(ValidationReport {
        complete: missing_fields.is_empty(),
        missing_fields,
        defaulted_fields,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed read-only views
// ────────────────────────────────────────────────────────────────────────────

fn number_field(payload: &Value, key: &str) -> f64 {
    payload.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn string_field(payload: &Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Analysis payload with every absent or mistyped field read as 0 / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: f64,
    pub category_scores: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub summary: String,
}

impl AnalysisResult {
    pub fn from_payload(payload: &Value) -> Self {
        let category_scores = payload
            .get("categoryScores")
            .and_then(Value::as_object)
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|(name, score)| score.as_f64().map(|s| (name.clone(), s)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            overall_score: number_field(payload, "overallScore"),
            category_scores,
            strengths: string_list(payload, "strengths"),
            weaknesses: string_list(payload, "weaknesses"),
            missing_keywords: string_list(payload, "missingKeywords"),
            suggestions: string_list(payload, "suggestions"),
            summary: string_field(payload, "summary"),
        }
    }
}

/// Match payload with every absent or mistyped field read as 0 / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub match_score: f64,
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub summary: String,
}

impl MatchResult {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            match_score: number_field(payload, "matchScore"),
            matching_keywords: string_list(payload, "matchingKeywords"),
            missing_keywords: string_list(payload, "missingKeywords"),
            suggestions: string_list(payload, "suggestions"),
            summary: string_field(payload, "summary"),
        }
    }
}
