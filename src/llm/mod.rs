//! LLM integration for StrayMatch.
//!
//! The chat flow talks to an `LlmProvider`. Production completions go through
//! rig-core's OpenAI client, bridged by `RigAdapter`; tests substitute stubs.

pub mod prompts;
pub mod provider;
mod rig_adapter;

pub use prompts::SYSTEM_PROMPT;
pub use provider::*;
pub use rig_adapter::{EMPTY_REPLY, RigAdapter};

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::config::CompletionConfig;
use crate::error::LlmError;

/// Create the production provider with the assistant's system prompt attached.
pub fn create_provider(config: &CompletionConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    let adapter = RigAdapter::new(model, &config.model, "openai")
        .with_sampling(config.temperature, config.max_tokens)
        .with_system_prompt(SYSTEM_PROMPT);
    Ok(Arc::new(adapter))
}
