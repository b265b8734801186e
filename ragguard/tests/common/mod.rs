//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ragguard::provider::ChatMessage;
use ragguard::{
    ChatPipeline, CompletionClient, CompletionRequest, CompletionService, ProviderError,
    QueryMode, QueryParameters, RetrievalError, Retriever, TextStream,
};
use ragguard_cache::{EmbeddingCache, Embedding};

pub const PRICE_CONTEXT: &str = "Bảo hiểm bắt buộc trách nhiệm dân sự xe máy: phí bảo hiểm cho xe máy trên 50cc là 60.000 VNĐ/năm, xe dưới 50cc là 55.000 VNĐ/năm. Quyền lợi: bồi thường thiệt hại về người và tài sản cho bên thứ ba theo quy định.";

pub const PRICE_ANSWER: &str = "Dạ, phí bảo hiểm bắt buộc xe máy trên 50cc là 60.000 VNĐ/năm ạ. Anh/chị còn thắc mắc gì khác em có thể hỗ trợ không ạ?";

/// Retriever returning a fixed reply per mode and recording every call
pub struct ScriptedRetriever {
    augmented: Result<String, RetrievalError>,
    plain: Result<String, RetrievalError>,
    calls: Mutex<Vec<QueryParameters>>,
}

impl ScriptedRetriever {
    pub fn new(context: &str) -> Self {
        Self {
            augmented: Ok(context.to_string()),
            plain: Ok(context.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            augmented: Err(RetrievalError::Network("connection refused".to_string())),
            plain: Err(RetrievalError::Network("connection refused".to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_augmented(mut self, reply: Result<String, RetrievalError>) -> Self {
        self.augmented = reply;
        self
    }

    pub fn calls(&self) -> Vec<QueryParameters> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn query(
        &self,
        _question: &str,
        params: &QueryParameters,
    ) -> Result<String, RetrievalError> {
        self.calls.lock().unwrap().push(params.clone());
        match params.mode {
            QueryMode::Augmented => self.augmented.clone(),
            QueryMode::Plain => self.plain.clone(),
        }
    }
}

/// Completion service replaying scripted replies and counting calls
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    default_reply: String,
    deltas: Vec<String>,
    fail_stream_after: Option<usize>,
    fail_stream_open: bool,
    pub completion_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    pub embedding_calls: AtomicUsize,
    last_messages: Mutex<Option<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn answering(reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: reply.to_string(),
            deltas: Vec::new(),
            fail_stream_after: None,
            fail_stream_open: false,
            completion_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            embedding_calls: AtomicUsize::new(0),
            last_messages: Mutex::new(None),
        }
    }

    /// Replies consumed in order before falling back to the default reply
    pub fn with_replies(self, replies: Vec<Result<String, ProviderError>>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    pub fn streaming(mut self, deltas: &[&str]) -> Self {
        self.deltas = deltas.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn failing_stream_after(mut self, deltas: usize) -> Self {
        self.fail_stream_after = Some(deltas);
        self
    }

    pub fn failing_stream_open(mut self) -> Self {
        self.fail_stream_open = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst) + self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Option<Vec<ChatMessage>> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn embeddings(
        &self,
        texts: &[String],
        _model: &str,
    ) -> Result<Vec<Embedding>, ProviderError> {
        self.embedding_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.chars().count() as f32; 4]).collect())
    }

    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = Some(request.messages.clone());
        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    async fn chat_completion_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<TextStream, ProviderError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = Some(request.messages.clone());
        if self.fail_stream_open {
            return Err(ProviderError::ServerError("stream refused".to_string()));
        }

        let mut items: Vec<Result<String, ProviderError>> = Vec::new();
        for (i, delta) in self.deltas.iter().enumerate() {
            if self.fail_stream_after == Some(i) {
                items.push(Err(ProviderError::StreamError("connection reset".to_string())));
                break;
            }
            items.push(Ok(delta.clone()));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn client_for(service: Arc<ScriptedCompletion>) -> Arc<CompletionClient> {
    Arc::new(CompletionClient::with_service(
        service,
        Arc::new(EmbeddingCache::new(Duration::from_secs(3600))),
        "text-embedding-3-small",
    ))
}

pub fn pipeline(
    retriever: Arc<ScriptedRetriever>,
    service: Arc<ScriptedCompletion>,
) -> Arc<ChatPipeline> {
    Arc::new(ChatPipeline::builder(retriever, client_for(service)).build())
}
