//! bluf LLM layer
//!
//! Provider registry, OpenAI-compatible chat client, and the summarizer
//! (retry with backoff, LRU cache, bounded batch execution) plus the
//! envelope that normalizes its results.

mod cache;
mod client;
mod envelope;
mod llm_trait;
mod params;
mod prompts;
mod provider;
mod retry;
mod summarize;
mod types;

pub use cache::SummaryCache;
pub use client::OpenAiCompatClient;
pub use envelope::{timestamp_now, Envelope, ErrorBody, SuccessBody, TIMESTAMP_FORMAT};
pub use llm_trait::ChatBackend;
pub use params::{GenerationParams, ParamsBuilder};
pub use prompts::{PromptTemplate, SYSTEM_PROMPT, USER_PROMPT_FORMAT};
pub use provider::{ClientDescriptor, ClientKind, OpenRouterModel, ProviderConfig, ProviderId, ProviderRegistry};
pub use retry::RetryPolicy;
pub use summarize::{SummarizerClient, SummarizerOptions};
pub use types::{ChatMessage, Role, SummaryOutput};

// Re-export for batch callers
pub use tokio_util::sync::CancellationToken;
