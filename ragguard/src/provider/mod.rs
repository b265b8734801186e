//! Completion and embedding providers
//!
//! [`CompletionService`] is the seam to the hosted model API. The pipeline never
//! talks to it directly; it goes through [`CompletionClient`], which owns the
//! embedding cache and builds the service on first use.

pub mod client;
pub mod error;
pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use ragguard_cache::Embedding;
use serde::{Deserialize, Serialize};

pub use client::{CompletionClient, PLACEHOLDER_DIMENSION, PLACEHOLDER_VALUE};
pub use error::ProviderError;
pub use openai::OpenAiClient;

/// Incremental text deltas from a streamed completion
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Generation knobs applied to every completion
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_LLM_MODEL.to_string(),
            max_tokens: crate::config::DEFAULT_LLM_MAX_TOKENS,
            temperature: crate::config::DEFAULT_TEMPERATURE,
        }
    }
}

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub settings: GenerationSettings,
}

/// Hosted model API: embeddings plus plain and streamed chat completions
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Embed every text, returning vectors in input order
    async fn embeddings(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Embedding>, ProviderError>;

    /// Run a completion and return the full answer text
    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Run a completion and return its text deltas as they arrive
    async fn chat_completion_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<TextStream, ProviderError>;
}
