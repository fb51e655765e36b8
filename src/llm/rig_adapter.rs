//! Bridges rig's `CompletionModel` to our `LlmProvider`.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role,
};

/// Shown when the provider returns no text content.
pub const EMPTY_REPLY: &str = "Sorry, I could not generate a response.";

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
    temperature: f32,
    max_tokens: u32,
    system_prompt: Option<String>,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
            temperature: 0.7,
            max_tokens: 300,
            system_prompt: None,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Rig splits a conversation into preamble, history and the final prompt.
#[derive(Debug)]
struct Conversation {
    preamble: Option<String>,
    history: Vec<Message>,
    prompt: Message,
}

/// Split our messages into rig's shape. A leading system message overrides
/// the configured prompt; the last non-system message becomes the prompt.
fn split_conversation(
    messages: Vec<ChatMessage>,
    default_preamble: Option<&str>,
) -> Option<Conversation> {
    let mut preamble = default_preamble.map(str::to_string);
    let mut turns: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            Role::System => preamble = Some(message.content),
            Role::User => turns.push(Message::user(message.content)),
            Role::Assistant => turns.push(Message::assistant(message.content)),
        }
    }
    let prompt = turns.pop()?;
    Some(Conversation {
        preamble,
        history: turns,
        prompt,
    })
}

/// First text part of the reply, or [`EMPTY_REPLY`].
fn reply_text(choice: OneOrMany<AssistantContent>) -> String {
    choice
        .into_iter()
        .find_map(|content| match content {
            AssistantContent::Text(text) if !text.text.is_empty() => Some(text.text),
            _ => None,
        })
        .unwrap_or_else(|| EMPTY_REPLY.to_string())
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let temperature = request.temperature.unwrap_or(self.temperature);
        let max_tokens = request.max_tokens.unwrap_or(self.max_tokens);
        let conversation = split_conversation(request.messages, self.system_prompt.as_deref())
            .ok_or_else(|| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: "no user or assistant message to send".to_string(),
            })?;

        let mut builder = self
            .model
            .completion_request(conversation.prompt)
            .messages(conversation.history)
            .temperature(f64::from(temperature))
            .max_tokens(u64::from(max_tokens));
        if let Some(preamble) = conversation.preamble {
            builder = builder.preamble(preamble);
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: e.to_string(),
        })?;

        let input_tokens = u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX);
        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);
        tracing::debug!(input_tokens, output_tokens, "Completion received");

        Ok(CompletionResponse {
            content: reply_text(response.choice),
            input_tokens,
            output_tokens,
        })
    }
}
