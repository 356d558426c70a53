use crate::error::BlufError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Provider names paired with their environment variable prefix
pub const PROVIDER_ENV_PREFIXES: [(&str, &str); 5] = [
    ("openai", "OPENAI"),
    ("groq", "GROQ"),
    ("mistral", "MISTRAL"),
    ("together", "TOGETHER"),
    ("openrouter", "OPENROUTER"),
];

/// Per-provider settings read from the environment
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderEnv {
    /// API credential (`<PREFIX>_API_KEY`)
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    /// Base URL override (`<PREFIX>_BASE_URL`)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEnv")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// bluf application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Network timeout for a single provider call
    pub request_timeout_secs: u64,

    /// Provider attempts per summarization
    pub max_retries: u32,

    /// Base delay for exponential backoff
    pub retry_delay_secs: f64,

    /// Summary cache capacity per client
    pub cache_capacity: usize,

    /// Default worker count for batch summarization
    pub batch_max_workers: usize,

    /// Pooled summarizers kept by the server, least recently used evicted first
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Provider credentials and endpoint overrides, keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEnv>,
}

fn default_pool_capacity() -> usize {
    32
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
            request_timeout_secs: 60,
            max_retries: 3,
            retry_delay_secs: 1.0,
            cache_capacity: 128,
            batch_max_workers: 4,
            pool_capacity: default_pool_capacity(),
            providers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, BlufError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        config.ensure_directories()?;

        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BlufError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mut providers = BTreeMap::new();
        for (name, prefix) in PROVIDER_ENV_PREFIXES {
            providers.insert(
                name.to_string(),
                ProviderEnv {
                    api_key: get(format!("{}_API_KEY", prefix).as_str()),
                    base_url: get(format!("{}_BASE_URL", prefix).as_str()),
                },
            );
        }

        let config = Self {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: Self::parse_var(&get, "SERVER_PORT")?.unwrap_or(defaults.server_port),
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            request_timeout_secs: Self::parse_var(&get, "REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
            max_retries: Self::parse_var(&get, "MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_delay_secs: Self::parse_var(&get, "RETRY_DELAY_SECS")?
                .unwrap_or(defaults.retry_delay_secs),
            cache_capacity: Self::parse_var(&get, "CACHE_CAPACITY")?
                .unwrap_or(defaults.cache_capacity),
            batch_max_workers: Self::parse_var(&get, "BATCH_MAX_WORKERS")?
                .unwrap_or(defaults.batch_max_workers),
            pool_capacity: Self::parse_var(&get, "POOL_CAPACITY")?.unwrap_or(defaults.pool_capacity),
            providers,
        };

        config.validate()?;

        Ok(config)
    }

    fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>, BlufError>
    where
        T: std::str::FromStr,
        G: Fn(&str) -> Option<String>,
    {
        match get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| BlufError::config(format!("{} has an invalid value: {}", key, raw))),
            None => Ok(None),
        }
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), BlufError> {
        if !self.log_dir.exists() {
            std::fs::create_dir_all(&self.log_dir).map_err(|e| {
                BlufError::config(format!(
                    "Failed to create directory {}: {}",
                    self.log_dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Credential configured for a provider, if any
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.as_deref())
    }

    /// Base URL override configured for a provider, if any
    pub fn base_url(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.base_url.as_deref())
    }

    /// Get log file path
    pub fn get_log_path(&self, filename: &str) -> PathBuf {
        self.log_dir.join(filename)
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BlufError> {
        if self.server_port == 0 {
            return Err(BlufError::config("Server port cannot be 0"));
        }

        if self.max_retries == 0 {
            return Err(BlufError::config("MAX_RETRIES must be at least 1"));
        }

        if !self.retry_delay_secs.is_finite() || self.retry_delay_secs < 0.0 {
            return Err(BlufError::config("RETRY_DELAY_SECS must be a non-negative number"));
        }

        if self.cache_capacity == 0 {
            return Err(BlufError::config("CACHE_CAPACITY must be at least 1"));
        }

        if self.batch_max_workers == 0 {
            return Err(BlufError::config("BATCH_MAX_WORKERS must be at least 1"));
        }

        if self.pool_capacity == 0 {
            return Err(BlufError::config("POOL_CAPACITY must be at least 1"));
        }

        for (name, provider) in &self.providers {
            if let Some(url) = &provider.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(BlufError::config(format!(
                        "{} base URL must start with http:// or https://",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}
