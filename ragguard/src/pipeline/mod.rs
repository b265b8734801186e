//! Answer pipelines
//!
//! [`ChatPipeline`] ties the building blocks together. `chat` runs the full
//! cache, retrieve, generate, gate sequence and returns one string;
//! `chat_stream` yields the answer incrementally. Neither ever fails: every
//! error is logged and becomes one of the canned messages.

mod chat;
mod stream;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ragguard_cache::{CacheConfig, EmbeddingCache, ResponseCache};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::guard::{AnswerQualityGate, CannedMessages, GuardrailConfig, SufficiencyGate};
use crate::prompt::PromptAssembler;
use crate::provider::{CompletionClient, GenerationSettings};
use crate::retriever::{HttpRetriever, QueryParameters, Retriever};

pub use stream::AnswerStream;

/// Frequently asked questions embedded at startup
pub const DEFAULT_WARMUP_QUESTIONS: &[&str] = &[
    "Bảo hiểm xe máy là gì?",
    "Phí bảo hiểm xe máy bao nhiêu?",
    "Quy trình mua bảo hiểm xe máy?",
    "Bảo hiểm sức khỏe là gì?",
    "Bảo hiểm bắt buộc là gì?",
    "Bảo hiểm ô tô là gì?",
    "Quy trình nộp hồ sơ bồi thường?",
    "Bảo hiểm y tế là gì?",
];

pub struct ChatPipeline {
    retriever: Arc<dyn Retriever>,
    client: Arc<CompletionClient>,
    responses: Arc<ResponseCache>,
    sufficiency: SufficiencyGate,
    quality: AnswerQualityGate,
    prompt: PromptAssembler,
    messages: CannedMessages,
    generation: GenerationSettings,
    warmup_questions: Vec<String>,
    closed: AtomicBool,
}

impl ChatPipeline {
    pub fn builder(
        retriever: Arc<dyn Retriever>,
        client: Arc<CompletionClient>,
    ) -> ChatPipelineBuilder {
        ChatPipelineBuilder::new(retriever, client)
    }

    /// Production wiring: HTTP retriever, OpenAI-compatible client, TTL caches
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let guardrails = match &settings.guardrails_file {
            Some(path) => GuardrailConfig::from_yaml_file(path)?,
            None => GuardrailConfig::default(),
        };

        let embedding_config = CacheConfig::builder()
            .ttl(settings.embedding_cache_ttl)
            .cleanup_interval(settings.embedding_cleanup_interval)
            .try_build()?;
        let response_config = CacheConfig::builder()
            .ttl(settings.response_cache_ttl)
            .soft_capacity(100)
            .eviction_batch(50)
            .try_build()?;

        let embeddings = Arc::new(EmbeddingCache::with_config(embedding_config));
        let client = Arc::new(CompletionClient::from_settings(settings, embeddings));
        let retriever = Arc::new(HttpRetriever::new(settings.retriever_url.clone())?);

        info!(
            "Chat pipeline configured: model={}, retriever={}",
            settings.llm_model, settings.retriever_url
        );

        Ok(Self::builder(retriever, client)
            .response_cache(Arc::new(ResponseCache::new(response_config)))
            .guardrails(guardrails)
            .generation(GenerationSettings {
                model: settings.llm_model.clone(),
                max_tokens: settings.llm_max_tokens,
                temperature: settings.temperature,
            })
            .build())
    }

    pub fn response_cache(&self) -> &Arc<ResponseCache> {
        &self.responses
    }

    pub fn client(&self) -> &Arc<CompletionClient> {
        &self.client
    }

    /// Retrieve context for `question` and generate an answer from it
    ///
    /// The retriever is always asked for context only; generation happens here
    /// through the completion client. When `params.context_only` is set the
    /// context itself is returned. Empty context yields an empty answer.
    pub async fn generate(&self, question: &str, params: &QueryParameters) -> Result<String> {
        let context = self
            .retriever
            .query(question, &params.clone().with_context_only(true))
            .await?;

        if params.context_only {
            return Ok(context);
        }

        if context.trim().is_empty() {
            warn!("Retriever returned no context ({:?})", params.mode);
            return Ok(String::new());
        }

        debug!("Context length: {} chars", context.chars().count());
        let messages = self.prompt.messages(&context, question);
        self.client.complete(messages, &self.generation).await
    }

    /// Embed the warm-up questions in one batch; returns how many were embedded
    pub async fn prewarm(&self) -> usize {
        if self.warmup_questions.is_empty() {
            return 0;
        }

        let vectors = self.client.embed(&self.warmup_questions).await;
        let cached = self.client.embedding_cache().len().await;
        info!(
            "Pre-warmed {} common questions ({} embeddings cached)",
            vectors.len(),
            cached
        );
        vectors.len()
    }

    /// Run [`prewarm`](Self::prewarm) on a background task
    pub fn spawn_prewarm(self: &Arc<Self>) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.prewarm().await;
        })
    }

    /// Release held resources; calling it again is a no-op
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Chat pipeline already closed");
            return;
        }

        let embeddings = self.client.embedding_cache().clear_expired().await;
        let responses = self.responses.clear_expired().await;
        let stats = self.responses.stats().await;
        info!(
            "Chat pipeline closed (dropped {} expired embeddings, {} expired responses; {})",
            embeddings, responses, stats
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ChatPipelineBuilder {
    retriever: Arc<dyn Retriever>,
    client: Arc<CompletionClient>,
    responses: Option<Arc<ResponseCache>>,
    guardrails: GuardrailConfig,
    prompt: PromptAssembler,
    generation: GenerationSettings,
    warmup_questions: Vec<String>,
}

impl ChatPipelineBuilder {
    fn new(retriever: Arc<dyn Retriever>, client: Arc<CompletionClient>) -> Self {
        Self {
            retriever,
            client,
            responses: None,
            guardrails: GuardrailConfig::default(),
            prompt: PromptAssembler::default(),
            generation: GenerationSettings::default(),
            warmup_questions: DEFAULT_WARMUP_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn response_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.responses = Some(cache);
        self
    }

    pub fn guardrails(mut self, guardrails: GuardrailConfig) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn prompt(mut self, prompt: PromptAssembler) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn warmup_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warmup_questions = questions.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> ChatPipeline {
        let guardrails = self.guardrails;
        ChatPipeline {
            retriever: self.retriever,
            client: self.client,
            responses: self
                .responses
                .unwrap_or_else(|| Arc::new(ResponseCache::default())),
            sufficiency: SufficiencyGate::new(&guardrails.sufficiency),
            quality: AnswerQualityGate::new(
                &guardrails.quality,
                guardrails.messages.redirect.clone(),
            ),
            prompt: self.prompt,
            messages: guardrails.messages,
            generation: self.generation,
            warmup_questions: self.warmup_questions,
            closed: AtomicBool::new(false),
        }
    }
}
