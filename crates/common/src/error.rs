/// bluf error types
#[derive(Debug, thiserror::Error)]
pub enum BlufError {
    /// Provider identifier outside the supported set
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Configuration error (missing credential, bad server setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No model given and the provider has no default
    #[error("Configuration error: no model given and provider '{0}' has no default model")]
    UnresolvedModel(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// All retries exhausted
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered, but not with a usable generation
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Work aborted through a cancellation signal
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlufError {
    /// Create unsupported provider error
    pub fn unsupported_provider<S: Into<String>>(provider: S) -> Self {
        Self::UnsupportedProvider(provider.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create generation failed error
    pub fn generation_failed<S: Into<String>>(msg: S) -> Self {
        Self::GenerationFailed(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid response error
    pub fn invalid_response<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create cancelled error
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether another provider attempt may succeed.
    ///
    /// Only transport failures and empty/malformed generations qualify;
    /// validation errors can never succeed as given.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::InvalidResponse(_))
    }
}

// HTTP response conversion
impl BlufError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::UnsupportedProvider(_) => 400,
            Self::UnresolvedModel(_) => 400,
            Self::Json(_) => 400,
            Self::Config(_) => 500,
            Self::GenerationFailed(_) => 500,
            Self::Network(_) => 500,
            Self::InvalidResponse(_) => 500,
            Self::Cancelled(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BlufError::invalid_input("empty").status_code(), 400);
        assert_eq!(BlufError::unsupported_provider("acme").status_code(), 400);
        assert_eq!(BlufError::UnresolvedModel("groq".into()).status_code(), 400);
        assert_eq!(BlufError::generation_failed("boom").status_code(), 500);
        assert_eq!(BlufError::config("no key").status_code(), 500);
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(BlufError::network("timeout").is_retryable());
        assert!(BlufError::invalid_response("no choices").is_retryable());
        assert!(!BlufError::invalid_input("empty").is_retryable());
        assert!(!BlufError::unsupported_provider("acme").is_retryable());
        assert!(!BlufError::config("missing key").is_retryable());
        assert!(!BlufError::generation_failed("done").is_retryable());
    }

    #[test]
    fn test_unresolved_model_message() {
        let err = BlufError::UnresolvedModel("groq".into());
        assert!(err.to_string().contains("groq"));
    }
}
