// Resume AI pipeline: prompt building, generation, extraction, validation.
// All LLM calls go through llm_client; no direct Gemini calls here.

pub mod extractor;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod style;
pub mod validator;
