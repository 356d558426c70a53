use bluf_common::{AppConfig, Result};
use bluf_llm::{ProviderId, ProviderRegistry, SummarizerClient, SummarizerOptions};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type PoolKey = (ProviderId, String);

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Provider table built from the environment
    pub registry: ProviderRegistry,

    /// Summarizers keyed by (provider, resolved model); each keeps its own cache.
    /// Bounded by `config.pool_capacity`, least recently used evicted first.
    clients: RwLock<LruCache<PoolKey, Arc<SummarizerClient>>>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Self {
        let registry = ProviderRegistry::from_config(&config);
        Self::with_registry(config, registry)
    }

    /// Create state over an explicit registry
    pub fn with_registry(config: AppConfig, registry: ProviderRegistry) -> Self {
        let capacity = NonZeroUsize::new(config.pool_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            registry,
            clients: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Summarizer options for `model` from the server configuration
    pub fn options(&self, model: &str) -> Result<SummarizerOptions> {
        Ok(SummarizerOptions::from_config(&self.config)?.with_model(model))
    }

    /// Shared summarizer for a server-configured provider
    pub async fn pooled_client(&self, provider: &str, model: &str) -> Result<Arc<SummarizerClient>> {
        let id = self.registry.lookup(provider)?.id;
        let model = self.registry.resolve_model(provider, model)?;
        let key = (id, model);

        // write lock: a hit also refreshes recency
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = Arc::new(SummarizerClient::new(&self.registry, provider, self.options(&key.1)?)?);
        debug!("Pooled new summarizer - Provider: {}, Model: {}", key.0, key.1);
        if let Some((evicted, _)) = clients.push(key, client.clone()) {
            debug!("Evicted pooled summarizer - Provider: {}, Model: {}", evicted.0, evicted.1);
        }
        Ok(client)
    }

    /// One-off summarizer carrying the caller's credential; never pooled
    pub fn caller_client(&self, api_key: &str, provider: &str, model: &str) -> Result<SummarizerClient> {
        let id: ProviderId = provider.parse()?;
        let registry = self.registry.with_api_key(id, api_key);
        SummarizerClient::new(&registry, provider, self.options(model)?)
    }

    /// Number of pooled summarizers
    pub async fn pooled_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
