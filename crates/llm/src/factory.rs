//! Backend construction. Trimmed from the teacher's multi-provider
//! `LlmFactory` (Claude/Ollama/OpenAI/Azure) down to the single
//! Ollama-compatible HTTP backend this system needs for Tier-3 -- a narrow,
//! disabled-by-default classification call, not a conversational agent that
//! benefits from provider choice.

use std::sync::Arc;

use crate::backend::{LlmBackend, LlmConfig, OllamaBackend};
use crate::LlmError;

pub fn build_backend(config: LlmConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend = OllamaBackend::new(config)?;
    Ok(Arc::new(backend))
}
