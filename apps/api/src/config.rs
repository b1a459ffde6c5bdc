use anyhow::{Context, Result};

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration loaded from environment variables.
/// Fails at startup if a numeric variable is present but unparseable.
///
/// The Gemini API key is deliberately optional here: a missing key does not stop
/// the server, it surfaces on every generation request as a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base_url: String,
    pub generation_timeout_secs: u64,
    pub rate_limit_retries: u32,
    pub rate_limit_backoff_ms: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_api_base_url: optional_env("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            generation_timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", 120)?,
            rate_limit_retries: parse_env("RATE_LIMIT_RETRIES", 0)?,
            rate_limit_backoff_ms: parse_env("RATE_LIMIT_BACKOFF_MS", 1000)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating blank values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
