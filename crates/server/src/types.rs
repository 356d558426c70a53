use serde::Deserialize;

/// `/mai/summarize` request
#[derive(Debug, Deserialize)]
pub struct MaiRequest {
    /// Text to summarize
    pub input: String,
}

/// `/lcsai/summarize` request
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub provider: String,

    /// Empty selects the provider default
    #[serde(default)]
    pub model: String,

    #[serde(alias = "content")]
    pub text: String,
}

/// `/summarize/wpapi` request: caller-supplied credential
#[derive(Deserialize)]
pub struct CredentialedRequest {
    pub api_key: String,

    pub provider: String,

    #[serde(default)]
    pub model: String,

    #[serde(alias = "content")]
    pub text: String,
}

impl std::fmt::Debug for CredentialedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialedRequest")
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("text_len", &self.text.len())
            .finish()
    }
}

/// `/summarize/batch` request
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub provider: String,

    #[serde(default)]
    pub model: String,

    #[serde(alias = "contents")]
    pub texts: Vec<String>,

    /// Defaults to the configured worker count
    #[serde(default)]
    pub max_workers: Option<usize>,
}
