mod config;
mod documents;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GenerationClient;
use crate::pipeline::orchestrator::RetryPolicy;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeAI API v{}", env!("CARGO_PKG_VERSION"));

    // One generation client for the whole process
    let client = GenerationClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_api_base_url.clone(),
        Duration::from_secs(config.generation_timeout_secs),
    )?;
    info!("Generation client initialized (model: {})", config.gemini_model);
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail with a configuration error");
    }

    let retry_policy = RetryPolicy {
        max_retries: config.rate_limit_retries,
        base_delay: Duration::from_millis(config.rate_limit_backoff_ms),
    };
    info!(
        "Rate-limit retries: {} (base delay {}ms)",
        retry_policy.max_retries, config.rate_limit_backoff_ms
    );

    let state = AppState {
        generator: Arc::new(client),
        retry_policy,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
