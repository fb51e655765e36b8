//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Greeting that seeds every chat transcript.
pub const DEFAULT_GREETING: &str = "Hi! I'm here to help you with the animal you found. \
First, let me ask - is the animal injured or in immediate danger?";

/// Text-completion provider settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 300,
        }
    }
}

/// Chat flow settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// First assistant message in every transcript.
    pub greeting: String,
    /// Pause between showing the final assistant message and handing off to the form.
    pub handoff_delay: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            handoff_delay: Duration::from_millis(2000),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    pub chat: ChatConfig,
    pub db_path: PathBuf,
    /// Pre-authenticated user id for the terminal front-end.
    pub user_id: Option<String>,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let mut completion = CompletionConfig::new(SecretString::from(api_key));
        if let Ok(model) = std::env::var("STRAYMATCH_MODEL") {
            completion.model = model;
        }
        if let Some(temperature) = parse_var::<f32>("STRAYMATCH_TEMPERATURE")? {
            completion.temperature = temperature;
        }
        if let Some(max_tokens) = parse_var::<u32>("STRAYMATCH_MAX_TOKENS")? {
            completion.max_tokens = max_tokens;
        }

        let mut chat = ChatConfig::default();
        if let Some(ms) = parse_var::<u64>("STRAYMATCH_HANDOFF_DELAY_MS")? {
            chat.handoff_delay = Duration::from_millis(ms);
        }

        let db_path = std::env::var("STRAYMATCH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/straymatch.db"));

        let user_id = std::env::var("STRAYMATCH_USER_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            completion,
            chat,
            db_path,
            user_id,
        })
    }
}

/// Parse an optional environment variable, rejecting values that don't parse.
fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
