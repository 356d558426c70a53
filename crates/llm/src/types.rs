use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::params::GenerationParams;
use crate::provider::ProviderId;

/// Chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completions request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model name (e.g., "gpt-4o")
    pub model: &'a str,

    /// Conversation
    pub messages: &'a [ChatMessage],

    pub temperature: f32,

    pub max_tokens: u32,

    pub top_p: f32,

    pub frequency_penalty: f32,

    pub presence_penalty: f32,

    /// Stop sequences
    #[serde(skip_serializing_if = "no_stop_sequences")]
    pub stop: &'a [String],

    /// Number of generations
    pub n: u32,

    /// Always false; summaries are read as one body
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Build the wire request from messages and generation parameters
    pub fn new(messages: &'a [ChatMessage], params: &'a GenerationParams) -> Self {
        Self {
            model: params.model(),
            messages,
            temperature: params.temperature(),
            max_tokens: params.max_tokens(),
            top_p: params.top_p(),
            frequency_penalty: params.frequency_penalty(),
            presence_penalty: params.presence_penalty(),
            stop: params.stop(),
            n: params.n(),
            stream: false,
        }
    }
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

/// OpenAI-compatible chat completions response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Candidate generations
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Model that served the request
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// First generation with non-blank content
    pub fn first_generation(&self) -> Option<&str> {
        self.choices
            .iter()
            .filter_map(|c| c.message.content.as_deref())
            .find(|text| !text.trim().is_empty())
    }
}

/// Summarization result
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutput {
    /// Summary text (Markdown)
    pub text: String,

    /// Provider that produced it
    pub provider: ProviderId,

    /// Parameters the call was made with
    pub params: GenerationParams,

    /// Completion time
    pub created_at: DateTime<Local>,
}

impl SummaryOutput {
    /// Create new summary output stamped with the current time
    pub fn new(text: String, provider: ProviderId, params: GenerationParams) -> Self {
        Self {
            text,
            provider,
            params,
            created_at: Local::now(),
        }
    }

    /// Model used
    pub fn model(&self) -> &str {
        self.params.model()
    }
}
