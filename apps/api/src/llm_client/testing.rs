//! Scripted `TextGenerator` for pipeline and route tests. No network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerationError, GenerationRequest, TextGenerator};

/// Replays a fixed list of outcomes, one per call, and records every request.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unknown("script exhausted".to_string())))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
