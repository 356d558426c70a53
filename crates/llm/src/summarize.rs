use bluf_common::{AppConfig, BlufError, Result};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SummaryCache;
use crate::llm_trait::ChatBackend;
use crate::params::GenerationParams;
use crate::prompts::PromptTemplate;
use crate::provider::{ProviderConfig, ProviderId, ProviderRegistry};
use crate::retry::RetryPolicy;
use crate::types::SummaryOutput;

/// Characters of content shown in debug logs
const LOG_PREVIEW_CHARS: usize = 200;

/// Summarizer client settings
#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    /// Model override; `None` uses the provider default
    pub model: Option<String>,

    /// Provider attempts per summary
    pub max_retries: u32,

    /// Base delay for exponential backoff
    pub retry_delay: Duration,

    /// Cached summaries kept per client
    pub cache_capacity: usize,

    /// Network timeout for one provider call
    pub request_timeout: Duration,

    /// Sampling parameters; the model field is replaced by the resolved model
    pub params: GenerationParams,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            cache_capacity: 128,
            request_timeout: Duration::from_secs(60),
            params: GenerationParams::default(),
        }
    }
}

impl SummarizerOptions {
    /// Options from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let retry_delay = Duration::try_from_secs_f64(config.retry_delay_secs)
            .map_err(|e| BlufError::config(format!("Invalid retry delay: {}", e)))?;

        Ok(Self {
            model: None,
            max_retries: config.max_retries,
            retry_delay,
            cache_capacity: config.cache_capacity,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            params: GenerationParams::default(),
        })
    }

    /// Same options with a model override
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = if model.trim().is_empty() { None } else { Some(model) };
        self
    }
}

/// Backend lifecycle: metadata only until the first call needs a connection
enum Lifecycle {
    Unconfigured(ProviderConfig),
    Ready(Arc<dyn ChatBackend>),
}

/// Summarizer bound to one provider, model and retry policy
///
/// Owns its summary cache; identical content is summarized once per
/// client instance.
pub struct SummarizerClient {
    provider: ProviderId,
    params: GenerationParams,
    retry: RetryPolicy,
    timeout: Duration,
    template: PromptTemplate,
    lifecycle: Mutex<Lifecycle>,
    cache: SummaryCache,
}

impl SummarizerClient {
    /// Create new summarizer
    ///
    /// Fails immediately for an unsupported provider, a missing credential
    /// or an unresolvable model. The HTTP client itself is built on first use.
    pub fn new(registry: &ProviderRegistry, provider: &str, options: SummarizerOptions) -> Result<Self> {
        let config = registry.lookup(provider)?;
        config.credential()?;
        let model = registry.resolve_model(provider, options.model.as_deref().unwrap_or(""))?;

        Self::build(config.id, model, options, Lifecycle::Unconfigured(config.clone()))
    }

    /// Create summarizer over an already-connected backend
    pub fn with_backend(
        provider: ProviderId,
        backend: Arc<dyn ChatBackend>,
        options: SummarizerOptions,
    ) -> Result<Self> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| options.params.model().to_string());

        Self::build(provider, model, options, Lifecycle::Ready(backend))
    }

    fn build(provider: ProviderId, model: String, options: SummarizerOptions, lifecycle: Lifecycle) -> Result<Self> {
        let params = options.params.with_model(model)?;
        if params.stream() {
            return Err(BlufError::invalid_input(
                "streamed generations are not supported for summaries",
            ));
        }

        let client = Self {
            provider,
            params,
            retry: RetryPolicy::new(options.max_retries, options.retry_delay)?,
            timeout: options.request_timeout,
            template: PromptTemplate::SUMMARY,
            lifecycle: Mutex::new(lifecycle),
            cache: SummaryCache::new(options.cache_capacity)?,
        };

        info!(
            "Summarizer configured - Provider: {}, Model: {}, Retries: {}, Cache: {}",
            client.provider,
            client.params.model(),
            client.retry.max_retries(),
            options.cache_capacity
        );

        Ok(client)
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn model(&self) -> &str {
        self.params.model()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Number of cached summaries
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Discard every cached summary
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Summary cache cleared - Provider: {}", self.provider);
    }

    /// Whether the backend connection has been built
    pub fn is_ready(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Ready(_))
    }

    /// Build the backend connection if needed and return it
    pub fn ensure_ready(&self) -> Result<Arc<dyn ChatBackend>> {
        let mut lifecycle = self.lifecycle.lock();

        let backend = match &*lifecycle {
            Lifecycle::Ready(backend) => return Ok(backend.clone()),
            Lifecycle::Unconfigured(config) => config.connect(self.timeout)?,
        };

        info!("Provider connection ready: {}", backend.name());
        *lifecycle = Lifecycle::Ready(backend.clone());
        Ok(backend)
    }

    /// Summarize content, serving repeats from the cache
    pub async fn summarize(&self, content: &str) -> Result<String> {
        if content.trim().is_empty() {
            return Err(BlufError::invalid_input("content cannot be empty"));
        }

        debug!(
            "Summarize request - Provider: {}, Length: {} chars, Preview: {}",
            self.provider,
            content.len(),
            preview(content)
        );

        self.cache
            .get_or_try_insert_with(content, || self.generate_with_retry(content))
            .await
    }

    /// Summarize content and keep the call metadata
    pub async fn summarize_detailed(&self, content: &str) -> Result<SummaryOutput> {
        let text = self.summarize(content).await?;
        Ok(SummaryOutput::new(text, self.provider, self.params.clone()))
    }

    /// Summarize many inputs with at most `max_workers` calls in flight
    ///
    /// Output order matches input order. The first failure aborts the
    /// remaining work and is returned; partial results are discarded.
    pub async fn summarize_batch<S: AsRef<str>>(&self, contents: &[S], max_workers: usize) -> Result<Vec<String>> {
        self.summarize_batch_with_cancel(contents, max_workers, &CancellationToken::new())
            .await
    }

    /// [`summarize_batch`](Self::summarize_batch) that also stops when `cancel` fires
    pub async fn summarize_batch_with_cancel<S: AsRef<str>>(
        &self,
        contents: &[S],
        max_workers: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if max_workers == 0 {
            return Err(BlufError::invalid_input("max_workers must be at least 1"));
        }

        info!(
            "Starting batch summarization - Items: {}, Workers: {}",
            contents.len(),
            max_workers
        );

        let mut pending = stream::iter(contents.iter().enumerate().map(|(index, content)| async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(BlufError::cancelled("batch summarization cancelled")),
                result = self.summarize(content.as_ref()) => result,
            };
            (index, result)
        }))
        .buffer_unordered(max_workers);

        let mut results: Vec<Option<String>> = vec![None; contents.len()];
        while let Some((index, result)) = pending.next().await {
            match result {
                Ok(text) => results[index] = Some(text),
                Err(e) => {
                    // dropping `pending` aborts the calls still in flight
                    warn!("Batch item {}/{} failed: {}", index + 1, contents.len(), e);
                    return Err(e);
                }
            }
        }

        info!("Batch summarization complete - Items: {}", contents.len());
        Ok(results.into_iter().flatten().collect())
    }

    /// Provider call with exponential backoff
    async fn generate_with_retry(&self, content: &str) -> Result<String> {
        let backend = self.ensure_ready()?;
        let messages = self.template.render(content);
        let max_retries = self.retry.max_retries();

        let mut last_error = None;

        for attempt in 0..max_retries {
            let outcome = backend
                .generate(&messages, &self.params)
                .await
                .and_then(|text| {
                    if text.trim().is_empty() {
                        Err(BlufError::invalid_response(format!("Empty generation from {}", backend.name())))
                    } else {
                        Ok(text)
                    }
                });

            match outcome {
                Ok(text) => {
                    info!(
                        "Summary generated - Provider: {}, Attempts: {}, Length: {}",
                        self.provider,
                        attempt + 1,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if self.retry.has_next(attempt) {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            backend.name(),
                            attempt + 1,
                            max_retries,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(BlufError::generation_failed(format!(
            "{} failed after {} attempts: {}",
            self.provider, max_retries, reason
        )))
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Fails `failures` times with a transient error, then answers
    struct FlakyBackend {
        failures: usize,
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
    }

    impl FlakyBackend {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, _messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
            self.call_times.lock().push(Instant::now());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(BlufError::network("connection reset"))
            } else {
                Ok(format!("summary #{}", n))
            }
        }
    }

    /// Answers `<content>-result` after a per-content delay; "bad" always fails
    struct EchoBackend {
        delays: HashMap<&'static str, Duration>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EchoBackend {
        fn new(delays: &[(&'static str, u64)]) -> Arc<Self> {
            Arc::new(Self {
                delays: delays
                    .iter()
                    .map(|(k, ms)| (*k, Duration::from_millis(*ms)))
                    .collect(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prefix = PromptTemplate::SUMMARY.user_prompt("");
            let content = messages[1].content.strip_prefix(&prefix).unwrap_or_default().to_string();

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay = self.delays.get(content.as_str()).copied().unwrap_or(Duration::ZERO);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if content == "bad" {
                return Err(BlufError::network("provider unavailable"));
            }
            Ok(format!("{}-result", content))
        }
    }

    fn options(max_retries: u32) -> SummarizerOptions {
        SummarizerOptions {
            max_retries,
            ..SummarizerOptions::default()
        }
        .with_model("test-model")
    }

    fn client(backend: Arc<dyn ChatBackend>, max_retries: u32) -> SummarizerClient {
        SummarizerClient::with_backend(ProviderId::OpenRouter, backend, options(max_retries)).unwrap()
    }

    #[test]
    fn test_new_validates_eagerly() {
        let empty = ProviderRegistry::default();
        assert!(matches!(
            SummarizerClient::new(&empty, "acme", SummarizerOptions::default()),
            Err(BlufError::UnsupportedProvider(_))
        ));
        assert!(matches!(
            SummarizerClient::new(&empty, "openai", SummarizerOptions::default()),
            Err(BlufError::Config(_))
        ));

        let groq = ProviderRegistry::new(BTreeMap::from([(ProviderId::Groq, "gsk".to_string())]));
        assert!(matches!(
            SummarizerClient::new(&groq, "groq", SummarizerOptions::default()),
            Err(BlufError::UnresolvedModel(_))
        ));
        let ok = SummarizerClient::new(&groq, "groq", SummarizerOptions::default().with_model("llama3-8b"));
        assert_eq!(ok.unwrap().model(), "llama3-8b");
    }

    #[test]
    fn test_lifecycle_builds_backend_on_demand() {
        let registry = ProviderRegistry::new(BTreeMap::from([(ProviderId::OpenAi, "sk-test".to_string())]));
        let summarizer = SummarizerClient::new(&registry, "openai", SummarizerOptions::default()).unwrap();

        assert_eq!(summarizer.model(), "gpt-4o");
        assert!(!summarizer.is_ready());
        let backend = summarizer.ensure_ready().unwrap();
        assert_eq!(backend.name(), "openai");
        assert!(summarizer.is_ready());
        assert!(summarizer.ensure_ready().is_ok());
    }

    #[test]
    fn test_stream_params_rejected() {
        let mut opts = options(3);
        opts.params = GenerationParams::builder("m").stream(true).build().unwrap();
        let result = SummarizerClient::with_backend(ProviderId::OpenAi, FlakyBackend::new(0), opts);
        assert!(matches!(result, Err(BlufError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_blank_content_never_reaches_provider() {
        let backend = FlakyBackend::new(0);
        let summarizer = client(backend.clone(), 3);

        for content in ["", "   ", "\n\t"] {
            assert!(matches!(
                summarizer.summarize(content).await,
                Err(BlufError::InvalidInput(_))
            ));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exponential_backoff() {
        let backend = FlakyBackend::new(2);
        let summarizer = client(backend.clone(), 3);

        let text = summarizer.summarize("quarterly report").await.unwrap();
        assert_eq!(text, "summary #2");
        assert_eq!(backend.calls(), 3);

        let times = backend.call_times.lock().clone();
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert!(first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1100));
        assert!(second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let backend = FlakyBackend::new(usize::MAX);
        let summarizer = client(backend.clone(), 3);

        let err = summarizer.summarize("text").await.unwrap_err();
        assert!(matches!(err, BlufError::GenerationFailed(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(backend.calls(), 3);
        assert_eq!(summarizer.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_final_errors_are_not_retried() {
        struct Rejecting(AtomicUsize);

        #[async_trait]
        impl ChatBackend for Rejecting {
            fn name(&self) -> &str {
                "rejecting"
            }

            async fn generate(&self, _: &[ChatMessage], _: &GenerationParams) -> Result<String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(BlufError::generation_failed("401 invalid api key"))
            }
        }

        let backend = Arc::new(Rejecting(AtomicUsize::new(0)));
        let summarizer = client(backend.clone(), 5);
        assert!(summarizer.summarize("text").await.is_err());
        assert_eq!(backend.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_generation_is_retried() {
        struct EmptyThenText(AtomicUsize);

        #[async_trait]
        impl ChatBackend for EmptyThenText {
            fn name(&self) -> &str {
                "empty"
            }

            async fn generate(&self, _: &[ChatMessage], _: &GenerationParams) -> Result<String> {
                match self.0.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok("  ".to_string()),
                    _ => Ok("real summary".to_string()),
                }
            }
        }

        let backend = Arc::new(EmptyThenText(AtomicUsize::new(0)));
        let summarizer = client(backend.clone(), 3);
        assert_eq!(summarizer.summarize("text").await.unwrap(), "real summary");
        assert_eq!(backend.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_and_clear() {
        let backend = FlakyBackend::new(0);
        let summarizer = client(backend.clone(), 3);

        let first = summarizer.summarize("same text").await.unwrap();
        let second = summarizer.summarize("same text").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);

        summarizer.clear_cache();
        let third = summarizer.summarize("same text").await.unwrap();
        assert_eq!(backend.calls(), 2);
        assert_ne!(third, first);
    }

    #[tokio::test]
    async fn test_summarize_detailed_echoes_params() {
        let summarizer = client(FlakyBackend::new(0), 3);
        let output = summarizer.summarize_detailed("text").await.unwrap();

        assert_eq!(output.text, "summary #0");
        assert_eq!(output.provider, ProviderId::OpenRouter);
        assert_eq!(output.model(), "test-model");
        assert_eq!(output.params.max_tokens(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_preserves_input_order() {
        let backend = EchoBackend::new(&[("a", 300), ("b", 100), ("c", 0)]);
        let summarizer = client(backend.clone(), 3);

        let results = summarizer.summarize_batch(&["a", "b", "c"], 2).await.unwrap();
        assert_eq!(results, vec!["a-result", "b-result", "c-result"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_respects_worker_bound() {
        let backend = EchoBackend::new(&[("1", 50), ("2", 50), ("3", 50), ("4", 50), ("5", 50)]);
        let summarizer = client(backend.clone(), 3);

        let results = summarizer
            .summarize_batch(&["1", "2", "3", "4", "5"], 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(backend.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_fails_fast() {
        let backend = EchoBackend::new(&[("slow", 60_000)]);
        let summarizer = client(backend.clone(), 2);

        let started = Instant::now();
        let err = summarizer
            .summarize_batch(&["slow", "bad"], 2)
            .await
            .unwrap_err();
        assert!(matches!(err, BlufError::GenerationFailed(_)));
        // "bad" exhausts its retries long before "slow" finishes
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_batch_cancellation() {
        let backend = EchoBackend::new(&[]);
        let summarizer = client(backend.clone(), 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = summarizer
            .summarize_batch_with_cancel(&["a", "b"], 2, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BlufError::Cancelled(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_edge_cases() {
        let summarizer = client(EchoBackend::new(&[]), 3);
        let none: [&str; 0] = [];

        assert!(summarizer.summarize_batch(&none, 2).await.unwrap().is_empty());
        assert!(matches!(
            summarizer.summarize_batch(&["a"], 0).await,
            Err(BlufError::InvalidInput(_))
        ));
        assert!(matches!(
            summarizer.summarize_batch(&["a", " "], 2).await,
            Err(BlufError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
