//! Provider registry: identifier → connection configuration

use bluf_common::{AppConfig, BlufError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::client::OpenAiCompatClient;
use crate::llm_trait::ChatBackend;

/// Attribution header value sent to OpenRouter
const OPENROUTER_APP_TITLE: &str = "BLUF";

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Groq,
    Mistral,
    Together,
    /// Default routing provider (free-tier models)
    OpenRouter,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAi,
        ProviderId::Groq,
        ProviderId::Mistral,
        ProviderId::Together,
        ProviderId::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::Together => "together",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Environment variable holding this provider's credential
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
            Self::Together => "TOGETHER_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Groq | Self::Mistral | Self::Together => "",
            Self::OpenRouter => OpenRouterModel::default().as_str(),
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Mistral => "https://api.mistral.ai/v1",
            Self::Together => "https://api.together.xyz/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    fn client_kind(&self) -> ClientKind {
        match self {
            Self::OpenRouter => ClientKind::OpenRouter,
            _ => ClientKind::OpenAiCompatible,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = BlufError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BlufError::unsupported_provider(wanted))
    }
}

/// Free-tier models served through OpenRouter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenRouterModel {
    #[default]
    Llama3B,
    GeminiFlash8B,
    DeepSeekR1,
    MistralSmall3,
    Zephyr7B,
}

impl OpenRouterModel {
    pub const ALL: [OpenRouterModel; 5] = [
        OpenRouterModel::Llama3B,
        OpenRouterModel::GeminiFlash8B,
        OpenRouterModel::DeepSeekR1,
        OpenRouterModel::MistralSmall3,
        OpenRouterModel::Zephyr7B,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Llama3B => "meta-llama/llama-3.2-3b-instruct:free",
            Self::GeminiFlash8B => "google/gemini-flash-1.5-8b-exp",
            Self::DeepSeekR1 => "deepseek/deepseek-r1:free",
            Self::MistralSmall3 => "mistralai/mistral-small-24b-instruct-2501",
            Self::Zephyr7B => "huggingfaceh4/zephyr-7b-beta:free",
        }
    }
}

/// Concrete client type used to reach a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Plain OpenAI chat-completions dialect
    OpenAiCompatible,
    /// OpenAI dialect plus OpenRouter attribution headers
    OpenRouter,
}

impl ClientKind {
    /// Construct the backend for this kind
    pub fn build(
        &self,
        provider: ProviderId,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Arc<dyn ChatBackend>> {
        let extra_headers: &[(&'static str, &str)] = match self {
            Self::OpenAiCompatible => &[],
            Self::OpenRouter => &[("x-title", OPENROUTER_APP_TITLE)],
        };
        let client = OpenAiCompatClient::new(provider.as_str(), base_url, api_key, timeout, extra_headers)?;
        Ok(Arc::new(client))
    }
}

/// Which client to build and where it connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDescriptor {
    pub kind: ClientKind,
    pub base_url: String,
}

/// Registry entry for one provider
#[derive(Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,

    /// Empty means the caller must supply a model
    pub default_model: String,

    pub descriptor: ClientDescriptor,

    api_key: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("default_model", &self.default_model)
            .field("descriptor", &self.descriptor)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderConfig {
    fn new(id: ProviderId, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            id,
            default_model: id.default_model().to_string(),
            descriptor: ClientDescriptor {
                kind: id.client_kind(),
                base_url: base_url.unwrap_or_else(|| id.default_base_url().to_string()),
            },
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Credential, or a configuration error naming the missing variable
    pub fn credential(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            BlufError::config(format!(
                "{} is not set; provider '{}' is unavailable",
                self.id.api_key_var(),
                self.id
            ))
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the underlying backend; fails fast without a credential
    pub fn connect(&self, timeout: Duration) -> Result<Arc<dyn ChatBackend>> {
        let api_key = self.credential()?;
        self.descriptor
            .kind
            .build(self.id, &self.descriptor.base_url, api_key, timeout)
    }
}

/// Read-only provider table, safe to share without locking
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderId, ProviderConfig>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl ProviderRegistry {
    /// Create registry from explicit credentials; providers without one stay unusable
    pub fn new(credentials: BTreeMap<ProviderId, String>) -> Self {
        let entries = ProviderId::ALL
            .into_iter()
            .map(|id| (id, ProviderConfig::new(id, credentials.get(&id).cloned(), None)))
            .collect();
        Self { entries }
    }

    /// Create registry from application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let entries = ProviderId::ALL
            .into_iter()
            .map(|id| {
                let entry = ProviderConfig::new(
                    id,
                    config.api_key(id.as_str()).map(str::to_string),
                    config.base_url(id.as_str()).map(str::to_string),
                );
                (id, entry)
            })
            .collect();
        Self { entries }
    }

    /// Look up a provider by caller-supplied identifier
    pub fn lookup(&self, identifier: &str) -> Result<&ProviderConfig> {
        let id: ProviderId = identifier.parse()?;
        self.get(id)
    }

    /// Look up a provider by parsed identifier
    pub fn get(&self, id: ProviderId) -> Result<&ProviderConfig> {
        self.entries
            .get(&id)
            .ok_or_else(|| BlufError::unsupported_provider(id.as_str()))
    }

    /// Requested model if non-empty, else the provider default
    pub fn resolve_model(&self, identifier: &str, requested_model: &str) -> Result<String> {
        let config = self.lookup(identifier)?;
        let requested = requested_model.trim();

        if !requested.is_empty() {
            return Ok(requested.to_string());
        }
        if !config.default_model.is_empty() {
            return Ok(config.default_model.clone());
        }

        Err(BlufError::UnresolvedModel(config.id.to_string()))
    }

    /// Copy of the registry with one provider's credential replaced
    pub fn with_api_key(&self, id: ProviderId, api_key: impl Into<String>) -> Self {
        let mut registry = self.clone();
        if let Some(entry) = registry.entries.get_mut(&id) {
            entry.api_key = Some(api_key.into()).filter(|k: &String| !k.trim().is_empty());
        }
        registry
    }

    /// Point a provider at another endpoint
    pub fn with_base_url(mut self, id: ProviderId, base_url: impl Into<String>) -> Self {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.descriptor.base_url = base_url.into();
        }
        self
    }

    /// All entries in identifier order
    pub fn providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.entries.values()
    }
}
