//! Completion client adapter
//!
//! Wraps a [`CompletionService`] that is built on first use and shared by
//! every caller afterwards. Embedding requests go through the embedding cache:
//! only the misses are sent to the service, in a single batch, and the result
//! is reassembled in input order. An embedding failure never propagates; the
//! caller receives placeholder vectors instead.

use std::sync::Arc;

use ragguard_cache::{Embedding, EmbeddingCache};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{
    ChatMessage, CompletionRequest, CompletionService, GenerationSettings, OpenAiClient,
    ProviderError, TextStream,
};
use crate::config::Settings;
use crate::error::{BotError, Result};

/// Width of the placeholder vectors returned when embedding fails
pub const PLACEHOLDER_DIMENSION: usize = 1536;
/// Value of every component of a placeholder vector
pub const PLACEHOLDER_VALUE: f32 = 0.1;

type ServiceFactory = Box<dyn Fn() -> Result<Arc<dyn CompletionService>> + Send + Sync>;

pub struct CompletionClient {
    service: OnceCell<Arc<dyn CompletionService>>,
    factory: ServiceFactory,
    embedding_cache: Arc<EmbeddingCache>,
    embedding_model: String,
}

impl CompletionClient {
    /// Create a client whose service is built by `factory` on first use
    pub fn new<F>(
        factory: F,
        embedding_cache: Arc<EmbeddingCache>,
        embedding_model: impl Into<String>,
    ) -> Self
    where
        F: Fn() -> Result<Arc<dyn CompletionService>> + Send + Sync + 'static,
    {
        Self {
            service: OnceCell::new(),
            factory: Box::new(factory),
            embedding_cache,
            embedding_model: embedding_model.into(),
        }
    }

    /// Client backed by the OpenAI-compatible API named in `settings`
    pub fn from_settings(settings: &Settings, embedding_cache: Arc<EmbeddingCache>) -> Self {
        let api_key = settings.openai_api_key.clone();
        let base_url = settings.openai_base_url.clone();

        Self::new(
            move || {
                let client = OpenAiClient::new(api_key.clone(), base_url.clone())?;
                Ok(Arc::new(client) as Arc<dyn CompletionService>)
            },
            embedding_cache,
            settings.embedding_model.clone(),
        )
    }

    /// Client around an already constructed service
    pub fn with_service(
        service: Arc<dyn CompletionService>,
        embedding_cache: Arc<EmbeddingCache>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let factory_service = service.clone();
        Self {
            service: OnceCell::new_with(Some(service)),
            factory: Box::new(move || Ok(factory_service.clone())),
            embedding_cache,
            embedding_model: embedding_model.into(),
        }
    }

    /// The shared service handle, built exactly once even under concurrent first use
    pub async fn service(&self) -> Result<Arc<dyn CompletionService>> {
        self.service
            .get_or_try_init(|| async {
                let service = (self.factory)()?;
                info!("Completion service initialized");
                Ok::<_, BotError>(service)
            })
            .await
            .cloned()
    }

    pub fn embedding_cache(&self) -> &Arc<EmbeddingCache> {
        &self.embedding_cache
    }

    /// Embed `texts`, one vector per input in input order
    ///
    /// Never fails: when the service is unavailable every position gets a
    /// placeholder vector and nothing is cached.
    pub async fn embed(&self, texts: &[String]) -> Vec<Embedding> {
        match self.try_embed(texts).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!(
                    "Embedding {} texts failed, returning placeholder vectors: {}",
                    texts.len(),
                    e
                );
                vec![vec![PLACEHOLDER_VALUE; PLACEHOLDER_DIMENSION]; texts.len()]
            }
        }
    }

    async fn try_embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut slots: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<String> = Vec::new();
        let mut missing_positions: Vec<usize> = Vec::new();

        for (position, text) in texts.iter().enumerate() {
            match self.embedding_cache.get(text).await {
                Some(vector) => slots.push(Some(vector)),
                None => {
                    slots.push(None);
                    missing.push(text.clone());
                    missing_positions.push(position);
                }
            }
        }

        debug!(
            "Embedding request: {} texts, {} cached, {} to fetch",
            texts.len(),
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let service = self.service().await?;
            let fetched = service.embeddings(&missing, &self.embedding_model).await?;

            if fetched.len() != missing.len() {
                return Err(ProviderError::InvalidResponse(format!(
                    "requested {} embeddings, received {}",
                    missing.len(),
                    fetched.len()
                ))
                .into());
            }

            let filled = missing_positions.into_iter().zip(&missing).zip(fetched);
            for ((position, text), vector) in filled {
                self.embedding_cache.set(text, vector.clone()).await;
                slots[position] = Some(vector);
            }
        }

        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Run a non-streamed completion
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        settings: &GenerationSettings,
    ) -> Result<String> {
        let service = self.service().await?;
        let request = CompletionRequest {
            messages,
            settings: settings.clone(),
        };
        Ok(service.chat_completion(&request).await?)
    }

    /// Run a streamed completion, yielding text deltas as they arrive
    pub async fn stream_complete(
        &self,
        messages: Vec<ChatMessage>,
        settings: &GenerationSettings,
    ) -> Result<TextStream> {
        let service = self.service().await?;
        let request = CompletionRequest {
            messages,
            settings: settings.clone(),
        };
        Ok(service.chat_completion_stream(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Embeds each text as `[len]` and records every batch it receives
    #[derive(Default)]
    struct RecordingService {
        batches: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionService for RecordingService {
        async fn embeddings(
            &self,
            texts: &[String],
            _model: &str,
        ) -> std::result::Result<Vec<Embedding>, ProviderError> {
            self.batches.lock().unwrap().push(texts.to_vec());
            if self.fail {
                return Err(ProviderError::ServerError("down".to_string()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        async fn chat_completion(
            &self,
            request: &CompletionRequest,
        ) -> std::result::Result<String, ProviderError> {
            Ok(format!("echo: {}", request.messages.len()))
        }

        async fn chat_completion_stream(
            &self,
            _request: &CompletionRequest,
        ) -> std::result::Result<TextStream, ProviderError> {
            Ok(Box::pin(futures::stream::iter(vec![
                Ok("a".to_string()),
                Ok("b".to_string()),
            ])))
        }
    }

    fn cache() -> Arc<EmbeddingCache> {
        Arc::new(EmbeddingCache::new(Duration::from_secs(3600)))
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_fetches_only_misses_in_one_batch() {
        let service = Arc::new(RecordingService::default());
        let cache = cache();
        cache.set("bb", vec![42.0]).await;

        let client = CompletionClient::with_service(service.clone(), cache, "test-model");
        let vectors = client.embed(&texts(&["a", "bb", "cccc"])).await;

        assert_eq!(vectors, vec![vec![1.0], vec![42.0], vec![4.0]]);
        let batches = service.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], texts(&["a", "cccc"]));
    }

    #[tokio::test]
    async fn test_embed_all_cached_makes_no_call() {
        let service = Arc::new(RecordingService::default());
        let client = CompletionClient::with_service(service.clone(), cache(), "test-model");

        client.embed(&texts(&["x", "yy"])).await;
        let vectors = client.embed(&texts(&["yy", "x"])).await;

        assert_eq!(vectors, vec![vec![2.0], vec![1.0]]);
        assert_eq!(service.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_embed_failure_returns_placeholders_without_caching() {
        let service = Arc::new(RecordingService {
            fail: true,
            ..Default::default()
        });
        let cache = cache();
        let client = CompletionClient::with_service(service, cache.clone(), "test-model");

        let vectors = client.embed(&texts(&["one", "two"])).await;

        assert_eq!(vectors.len(), 2);
        for vector in &vectors {
            assert_eq!(vector.len(), PLACEHOLDER_DIMENSION);
            assert!(vector.iter().all(|v| *v == PLACEHOLDER_VALUE));
        }
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_embed_empty_input() {
        let service = Arc::new(RecordingService::default());
        let client = CompletionClient::with_service(service.clone(), cache(), "test-model");

        assert!(client.embed(&[]).await.is_empty());
        assert!(service.batches.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_service_is_built_once_under_concurrency() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let client = Arc::new(CompletionClient::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(RecordingService::default()) as Arc<dyn CompletionService>)
            },
            cache(),
            "test-model",
        ));

        let callers = (0..16).map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.service().await.is_ok() })
        });
        let results = futures::future::join_all(callers).await;

        assert!(results.into_iter().all(|r| r.unwrap()));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_failure_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let client = CompletionClient::new(
            move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(crate::error::BotError::Configuration("no key".to_string()))
                } else {
                    Ok(Arc::new(RecordingService::default()) as Arc<dyn CompletionService>)
                }
            },
            cache(),
            "test-model",
        );

        assert!(client.service().await.is_err());
        assert!(client.service().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_complete_and_stream() {
        use futures::StreamExt;

        let client = CompletionClient::with_service(
            Arc::new(RecordingService::default()),
            cache(),
            "test-model",
        );
        let settings = GenerationSettings::default();

        let answer = client
            .complete(vec![ChatMessage::system("s"), ChatMessage::user("u")], &settings)
            .await
            .unwrap();
        assert_eq!(answer, "echo: 2");

        let stream = client
            .stream_complete(vec![ChatMessage::user("u")], &settings)
            .await
            .unwrap();
        let deltas: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
        assert_eq!(deltas.concat(), "ab");
    }
}
