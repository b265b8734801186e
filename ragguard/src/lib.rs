//! Grounded retrieval-augmented chatbot
//!
//! Answers insurance questions strictly from retrieved context, redirecting
//! to human support when the context cannot ground an answer.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod retriever;

pub use api::{ApiServer, ApiServerConfig, AuthState};
pub use config::Settings;
pub use error::{BotError, Result};
pub use guard::{
    AnswerQualityGate, CannedMessages, GuardrailConfig, Sufficiency, SufficiencyGate,
    REDIRECT_MESSAGE, TECHNICAL_DIFFICULTY_MESSAGE,
};
pub use pipeline::{AnswerStream, ChatPipeline, ChatPipelineBuilder};
pub use prompt::PromptAssembler;
pub use provider::{
    ChatMessage, CompletionClient, CompletionRequest, CompletionService, GenerationSettings,
    OpenAiClient, ProviderError, TextStream,
};
pub use retriever::{HttpRetriever, QueryMode, QueryParameters, RetrievalError, Retriever};
