//! Text generation collaborator.
//!
//! The pipeline only depends on [`TextGenerator`]; [`OpenAiGenerator`] is the
//! HTTP implementation for OpenAI-compatible chat endpoints. Generated text is
//! untrusted and anything expected to be structured goes through
//! [`repair_json`].

pub mod error;
pub mod openai;
pub mod prompts;
pub mod repair;

use async_trait::async_trait;
use serde_json::Value;

pub use error::LlmError;
pub use openai::{is_placeholder_key, OpenAiGenerator};
pub use repair::{repair_json, JsonRepairError, RepairStrategy};

/// Appended to the system instruction of every JSON-mode request.
pub const JSON_INSTRUCTION: &str =
    "Respond with valid JSON only. Do not wrap it in Markdown code fences or add commentary.";

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generator's free-text answer to one system/user exchange.
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Requests JSON and recovers it from whatever text comes back.
pub async fn generate_json(
    generator: &dyn TextGenerator,
    system: &str,
    user: &str,
) -> Result<Value, LlmError> {
    let system = format!("{}\n\n{}", system.trim_end(), JSON_INSTRUCTION);
    let text = generator.generate(&system, user).await?;
    Ok(repair_json(&text)?)
}

/// Stand-in used when no API key is available. Every call fails with
/// [`LlmError::NotConfigured`], so callers take their local fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}
