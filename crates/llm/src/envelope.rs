//! Uniform success/error envelopes returned to HTTP callers

use bluf_common::{BlufError, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::types::SummaryOutput;

/// Timestamp layout used in every envelope
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in envelope format
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Successful result: caller payload plus timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessBody {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub timestamp: String,
}

/// Failed result; `trace` is reserved and always empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub timestamp: String,
    pub trace: String,
    #[serde(skip)]
    pub status: u16,
}

/// Exactly one of a success or an error body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessBody),
    Error(ErrorBody),
}

impl Envelope {
    /// Wrap a payload; an empty payload is refused
    pub fn success(payload: Map<String, Value>) -> Result<Self> {
        if payload.is_empty() {
            return Err(BlufError::invalid_input("success payload cannot be empty"));
        }

        Ok(Self::Success(SuccessBody {
            payload,
            timestamp: timestamp_now(),
        }))
    }

    /// Build an error envelope; needs a message and a non-zero status
    pub fn error(message: impl Into<String>, status: u16) -> Result<Self> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(BlufError::invalid_input("error message cannot be empty"));
        }
        if status == 0 {
            return Err(BlufError::invalid_input("error status code cannot be 0"));
        }

        Ok(Self::error_body(message, status))
    }

    /// Render a core error with its HTTP status
    pub fn from_error(err: &BlufError) -> Self {
        Self::error_body(err.to_string(), err.status_code())
    }

    /// Success envelope for one summary
    ///
    /// Body: `{summary: {output, html}, provider, model, temperature, max_tokens, timestamp}`.
    pub fn from_summary(output: &SummaryOutput, html: &str) -> Result<Self> {
        let mut payload = Map::new();
        payload.insert("summary".into(), json!({ "output": output.text, "html": html }));
        payload.insert("provider".into(), json!(output.provider));
        payload.insert("model".into(), json!(output.model()));
        payload.insert("temperature".into(), json!(output.params.temperature()));
        payload.insert("max_tokens".into(), json!(output.params.max_tokens()));

        let mut envelope = Self::success(payload)?;
        if let Self::Success(body) = &mut envelope {
            body.timestamp = output.created_at.format(TIMESTAMP_FORMAT).to_string();
        }
        Ok(envelope)
    }

    fn error_body(message: String, status: u16) -> Self {
        Self::Error(ErrorBody {
            error: message,
            timestamp: timestamp_now(),
            trace: String::new(),
            status,
        })
    }

    /// HTTP status for this envelope
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::Error(body) => body.status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::provider::ProviderId;
    use chrono::NaiveDateTime;

    fn assert_timestamp(value: &Value) {
        let raw = value.as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).is_ok(), "bad timestamp {}", raw);
    }

    #[test]
    fn test_success_requires_payload() {
        assert!(matches!(Envelope::success(Map::new()), Err(BlufError::InvalidInput(_))));

        let mut payload = Map::new();
        payload.insert("answer".into(), json!(42));
        let envelope = Envelope::success(payload).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.status_code(), 200);

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["answer"], 42);
        assert_timestamp(&body["timestamp"]);
    }

    #[test]
    fn test_error_rejects_malformed_input() {
        assert!(Envelope::error("", 400).is_err());
        assert!(Envelope::error("   ", 400).is_err());
        assert!(Envelope::error("msg", 0).is_err());
    }

    #[test]
    fn test_error_shape() {
        let envelope = Envelope::error("Missing field: input", 400).unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.status_code(), 400);

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["error"], "Missing field: input");
        assert_eq!(body["trace"], "");
        assert!(body.get("status").is_none());
        assert_timestamp(&body["timestamp"]);
    }

    #[test]
    fn test_from_error_maps_status() {
        let invalid = Envelope::from_error(&BlufError::invalid_input("content cannot be empty"));
        assert_eq!(invalid.status_code(), 400);

        let unsupported = Envelope::from_error(&BlufError::unsupported_provider("acme"));
        assert_eq!(unsupported.status_code(), 400);

        let failed = Envelope::from_error(&BlufError::generation_failed("timeout"));
        assert_eq!(failed.status_code(), 500);
    }

    #[test]
    fn test_from_summary_echoes_params() {
        let params = GenerationParams::builder("gpt-4o").temperature(0.2).build().unwrap();
        let output = SummaryOutput::new("**Bold** summary".to_string(), ProviderId::OpenAi, params);
        let envelope = Envelope::from_summary(&output, "<p><strong>Bold</strong> summary</p>").unwrap();

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["summary"]["output"], "**Bold** summary");
        assert_eq!(body["summary"]["html"], "<p><strong>Bold</strong> summary</p>");
        assert_eq!(body["provider"], "openai");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_timestamp(&body["timestamp"]);
    }
}
