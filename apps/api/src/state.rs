use std::sync::Arc;

use crate::llm_client::TextGenerator;
use crate::pipeline::orchestrator::{Pipeline, RetryPolicy};

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; concurrent requests share it without coordination.
#[derive(Clone)]
pub struct AppState {
    /// The one generation client, constructed in `main`.
    pub generator: Arc<dyn TextGenerator>,
    /// Applied by the orchestrator to `RateLimited` failures only.
    pub retry_policy: RetryPolicy,
}

impl AppState {
    /// Per-request orchestrator borrowing the shared client.
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(self.generator.as_ref(), self.retry_policy)
    }
}
