//! Generation parameters sent with every summarization call

use bluf_common::{BlufError, Result};
use serde::{Deserialize, Serialize};

use crate::provider::OpenRouterModel;

/// Validated generation parameters.
///
/// Out-of-range values are rejected, never clamped. Deserialization goes
/// through the same validation, so a `GenerationParams` always holds
/// in-range values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParams", into = "RawParams")]
pub struct GenerationParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop: Vec<String>,
    n: u32,
    stream: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: OpenRouterModel::default().as_str().to_string(),
            temperature: 0.5,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: Vec::new(),
            n: 1,
            stream: false,
        }
    }
}

impl GenerationParams {
    /// Start building parameters for `model`, seeded with defaults
    pub fn builder(model: impl Into<String>) -> ParamsBuilder {
        ParamsBuilder {
            raw: RawParams {
                model: model.into(),
                ..RawParams::from(Self::default())
            },
        }
    }

    /// Same parameters targeting another model
    pub fn with_model(&self, model: impl Into<String>) -> Result<Self> {
        let mut raw = RawParams::from(self.clone());
        raw.model = model.into();
        Self::try_from(raw)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn frequency_penalty(&self) -> f32 {
        self.frequency_penalty
    }

    pub fn presence_penalty(&self) -> f32 {
        self.presence_penalty
    }

    pub fn stop(&self) -> &[String] {
        &self.stop
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn stream(&self) -> bool {
        self.stream
    }
}

/// Builder for [`GenerationParams`]
#[derive(Debug, Clone)]
pub struct ParamsBuilder {
    raw: RawParams,
}

impl ParamsBuilder {
    pub fn temperature(mut self, value: f32) -> Self {
        self.raw.temperature = value;
        self
    }

    pub fn max_tokens(mut self, value: u32) -> Self {
        self.raw.max_tokens = value;
        self
    }

    pub fn top_p(mut self, value: f32) -> Self {
        self.raw.top_p = value;
        self
    }

    pub fn frequency_penalty(mut self, value: f32) -> Self {
        self.raw.frequency_penalty = value;
        self
    }

    pub fn presence_penalty(mut self, value: f32) -> Self {
        self.raw.presence_penalty = value;
        self
    }

    pub fn stop<I, S>(mut self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw.stop = sequences.into_iter().map(Into::into).collect();
        self
    }

    pub fn n(mut self, value: u32) -> Self {
        self.raw.n = value;
        self
    }

    pub fn stream(mut self, value: bool) -> Self {
        self.raw.stream = value;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<GenerationParams> {
        GenerationParams::try_from(self.raw)
    }
}

/// Unvalidated wire representation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(default)]
    stop: Vec<String>,
    n: u32,
    #[serde(default)]
    stream: bool,
}

impl From<GenerationParams> for RawParams {
    fn from(p: GenerationParams) -> Self {
        Self {
            model: p.model,
            temperature: p.temperature,
            max_tokens: p.max_tokens,
            top_p: p.top_p,
            frequency_penalty: p.frequency_penalty,
            presence_penalty: p.presence_penalty,
            stop: p.stop,
            n: p.n,
            stream: p.stream,
        }
    }
}

impl TryFrom<RawParams> for GenerationParams {
    type Error = BlufError;

    fn try_from(raw: RawParams) -> Result<Self> {
        if raw.model.trim().is_empty() {
            return Err(BlufError::invalid_input("model name cannot be empty"));
        }
        check_range("temperature", raw.temperature, 0.0, 1.0)?;
        check_range("top_p", raw.top_p, 0.0, 1.0)?;
        check_range("frequency_penalty", raw.frequency_penalty, -2.0, 2.0)?;
        check_range("presence_penalty", raw.presence_penalty, -2.0, 2.0)?;
        if raw.max_tokens == 0 {
            return Err(BlufError::invalid_input("max_tokens must be greater than 0"));
        }
        if raw.n == 0 {
            return Err(BlufError::invalid_input("n must be at least 1"));
        }

        Ok(Self {
            model: raw.model,
            temperature: raw.temperature,
            max_tokens: raw.max_tokens,
            top_p: raw.top_p,
            frequency_penalty: raw.frequency_penalty,
            presence_penalty: raw.presence_penalty,
            stop: raw.stop,
            n: raw.n,
            stream: raw.stream,
        })
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    // rejects NaN as well
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BlufError::invalid_input(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = GenerationParams::default();
        assert_eq!(params.model(), "meta-llama/llama-3.2-3b-instruct:free");
        assert_eq!(params.max_tokens(), 1000);
        assert_eq!(params.n(), 1);
        assert!(!params.stream());
        assert!(GenerationParams::try_from(RawParams::from(params)).is_ok());
    }

    #[test]
    fn test_builder_rejects_out_of_range() {
        let too_hot = GenerationParams::builder("gpt-4o").temperature(1.5).build();
        assert!(matches!(too_hot, Err(BlufError::InvalidInput(_))));

        assert!(GenerationParams::builder("gpt-4o").top_p(-0.1).build().is_err());
        assert!(GenerationParams::builder("gpt-4o").frequency_penalty(2.5).build().is_err());
        assert!(GenerationParams::builder("gpt-4o").presence_penalty(-3.0).build().is_err());
        assert!(GenerationParams::builder("gpt-4o").max_tokens(0).build().is_err());
        assert!(GenerationParams::builder("gpt-4o").n(0).build().is_err());
        assert!(GenerationParams::builder("gpt-4o").temperature(f32::NAN).build().is_err());
        assert!(GenerationParams::builder("  ").build().is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let params = GenerationParams::builder("gpt-4o")
            .temperature(1.0)
            .top_p(0.0)
            .frequency_penalty(-2.0)
            .presence_penalty(2.0)
            .build();
        assert!(params.is_ok());
    }

    #[test]
    fn test_wire_round_trip() {
        let params = GenerationParams::builder("mistral-small-latest")
            .temperature(0.2)
            .max_tokens(1500)
            .top_p(0.9)
            .frequency_penalty(0.1)
            .presence_penalty(0.1)
            .stop(["###", "END"])
            .n(2)
            .build()
            .unwrap();

        let json = serde_json::to_string(&params).unwrap();
        let back: GenerationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
        assert_eq!(back.stop(), ["###".to_string(), "END".to_string()]);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"model":"gpt-4o","temperature":1.5,"max_tokens":10,"top_p":1.0,
            "frequency_penalty":0.0,"presence_penalty":0.0,"n":1}"#;
        assert!(serde_json::from_str::<GenerationParams>(json).is_err());
    }

    #[test]
    fn test_with_model_keeps_tuning() {
        let params = GenerationParams::builder("a").temperature(0.3).build().unwrap();
        let swapped = params.with_model("b").unwrap();
        assert_eq!(swapped.model(), "b");
        assert_eq!(swapped.temperature(), 0.3);
        assert!(params.with_model("").is_err());
    }
}
