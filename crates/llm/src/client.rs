use async_trait::async_trait;
use bluf_common::{BlufError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::llm_trait::ChatBackend;
use crate::params::GenerationParams;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// Longest slice of an error body carried into error messages
const ERROR_BODY_LIMIT: usize = 300;

/// OpenAI-compatible chat completions client
///
/// Serves every provider that exposes `{base_url}/chat/completions`
/// (OpenAI, Groq, Mistral, Together, OpenRouter).
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    name: String,
    endpoint: String,
    client: Client,
}

impl OpenAiCompatClient {
    /// Create new client
    ///
    /// `extra_headers` are sent with every request next to the bearer token.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        extra_headers: &[(&'static str, &str)],
    ) -> Result<Self> {
        let name = name.into();

        if api_key.trim().is_empty() {
            return Err(BlufError::config(format!("{} API key is empty", name)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| BlufError::config(format!("{} API key is not a valid header: {}", name, e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        for (key, value) in extra_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| BlufError::config(format!("Invalid header name {}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| BlufError::config(format!("Invalid header {}: {}", key, e)))?;
            headers.insert(header_name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BlufError::config(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        debug!("{} client initialized: {}", name, endpoint);

        Ok(Self {
            name,
            endpoint,
            client,
        })
    }

    /// Chat completions URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single attempt to generate text
    async fn try_generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String> {
        let request = ChatCompletionRequest::new(messages, params);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BlufError::network(format!("Failed to send request to {}: {}", self.name, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, &body));
        }

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            BlufError::invalid_response(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        if let Some(served_by) = result.model.as_deref().filter(|m| *m != params.model()) {
            debug!("{} served model {} for requested {}", self.name, served_by, params.model());
        }

        result
            .first_generation()
            .map(str::to_string)
            .ok_or_else(|| BlufError::invalid_response(format!("Empty response from {}", self.name)))
    }

    /// Timeouts, throttling and server faults are transient; other
    /// rejections (bad key, unknown model) fail the call for good.
    fn status_error(&self, status: StatusCode, body: &str) -> BlufError {
        let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        let message = format!("{} API error {}: {}", self.name, status, snippet.trim());

        if status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            BlufError::network(message)
        } else {
            BlufError::generation_failed(message)
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String> {
        debug!(
            "Sending chat request to {} - Model: {}, Messages: {}",
            self.name,
            params.model(),
            messages.len()
        );

        let text = self.try_generate(messages, params).await?;

        debug!("Received response from {} - Length: {}", self.name, text.len());
        Ok(text)
    }
}
