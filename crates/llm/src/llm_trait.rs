use async_trait::async_trait;
use bluf_common::Result;

use crate::params::GenerationParams;
use crate::types::ChatMessage;

/// Common trait for chat-completion backends
///
/// One call, one attempt: retries and caching belong to the summarizer.
/// Implementations report transient conditions as `Network` or
/// `InvalidResponse` so the caller can retry them.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate text for a message exchange
    async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String>;
}
