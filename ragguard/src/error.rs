//! Error types for the answer pipeline
//!
//! None of these ever reach a caller of `chat`/`chat_stream`: the pipelines
//! log them and translate them into one of the two canned user-facing
//! messages. They do surface from startup (`Settings`, guardrail files) and
//! from the building blocks when used directly.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::retriever::RetrievalError;

/// Main error type for ragguard
#[derive(Error, Debug)]
pub enum BotError {
    /// Missing or malformed configuration; the process must not serve requests
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding or completion call failed, timed out or ran out of retries
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The retrieval capability failed
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Cache configuration rejected
    #[error("Cache error: {0}")]
    Cache(#[from] ragguard_cache::CacheError),

    /// I/O error (config files, terminal)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for ragguard operations
pub type Result<T> = std::result::Result<T, BotError>;

impl From<String> for BotError {
    fn from(s: String) -> Self {
        BotError::Other(s)
    }
}

impl From<&str> for BotError {
    fn from(s: &str) -> Self {
        BotError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BotError::Configuration("OPENAI_API_KEY not set".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: OPENAI_API_KEY not set"
        );

        let error: BotError = ProviderError::Timeout("embeddings".to_string()).into();
        assert!(error.to_string().starts_with("Provider error:"));

        let error: BotError = RetrievalError::Network("connection refused".to_string()).into();
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_conversion() {
        let error: BotError = "test error".into();
        assert!(matches!(error, BotError::Other(_)));

        let error: BotError = "test error".to_string().into();
        assert!(matches!(error, BotError::Other(_)));
    }
}
