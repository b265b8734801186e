//! OpenAI-compatible HTTP provider
//!
//! Talks to `/embeddings` and `/chat/completions` under a configurable base
//! URL. Every call is bounded by a fixed timeout and retried a fixed number of
//! times on transient failures. Streams are only retried while opening; once
//! deltas have been handed out a failure ends the stream.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use ragguard_cache::Embedding;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::{ChatMessage, CompletionRequest, CompletionService, ProviderError, TextStream};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for an OpenAI-compatible API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Run `call` until it succeeds, fails permanently or retries run out
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        operation,
                        attempt,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn open_stream(
        &self,
        body: &ChatCompletionBody<'_>,
    ) -> Result<reqwest::Response, ProviderError> {
        let send = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no response headers within {:?}", self.timeout))
            })??;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_http_status(status.as_u16(), &body))
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn embeddings(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Embedding>, ProviderError> {
        let body = &EmbeddingBody { model, input: texts };

        let parsed: EmbeddingResponse = self
            .with_retry("embeddings", || async move {
                let response = self.post_json("embeddings", body).await?;
                response.json::<EmbeddingResponse>().await.map_err(ProviderError::from)
            })
            .await?;

        if parsed.data.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|item| item.index);
        debug!("Embedded {} texts with {}", texts.len(), model);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = &ChatCompletionBody::new(request, false);

        let parsed: ChatCompletionResponse = self
            .with_retry("chat completion", || async move {
                let response = self.post_json("chat/completions", body).await?;
                response
                    .json::<ChatCompletionResponse>()
                    .await
                    .map_err(ProviderError::from)
            })
            .await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("completion has no content".to_string()))
    }

    async fn chat_completion_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<TextStream, ProviderError> {
        let body = &ChatCompletionBody::new(request, true);
        let response = self
            .with_retry("chat completion stream", || self.open_stream(body))
            .await?;

        let idle_timeout = self.timeout;
        let stream = async_stream::stream! {
            let byte_stream = Box::pin(
                response
                    .bytes_stream()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
            );
            let mut reader = BufReader::new(StreamReader::new(byte_stream));
            let mut line_buffer = String::new();

            loop {
                line_buffer.clear();
                let next_line = reader.read_line(&mut line_buffer);
                let read = match tokio::time::timeout(idle_timeout, next_line).await {
                    Ok(read) => read,
                    Err(_) => {
                        yield Err(ProviderError::Timeout(format!(
                            "no stream data within {:?}",
                            idle_timeout
                        )));
                        break;
                    }
                };

                match read {
                    Ok(0) => break,
                    Ok(_) => match parse_sse_line(line_buffer.trim()) {
                        SseLine::Delta(text) => yield Ok(text),
                        SseLine::Skip => continue,
                        SseLine::Done => break,
                        SseLine::Failed(message) => {
                            yield Err(ProviderError::StreamError(message));
                            break;
                        }
                    },
                    Err(e) => {
                        yield Err(ProviderError::StreamError(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// One decoded server-sent-events line
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Delta(String),
    Skip,
    Done,
    Failed(String),
}

fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                return SseLine::Failed(error.to_string());
            }
            let text: String = chunk
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .collect();
            if text.is_empty() {
                SseLine::Skip
            } else {
                SseLine::Delta(text)
            }
        }
        Err(e) => {
            warn!("Failed to parse SSE chunk: {} - data: {}", e, data);
            SseLine::Skip
        }
    }
}

// Wire types

#[derive(Serialize)]
struct EmbeddingBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

impl<'a> ChatCompletionBody<'a> {
    fn new(request: &'a CompletionRequest, stream: bool) -> Self {
        Self {
            model: &request.settings.model,
            messages: &request.messages,
            max_tokens: request.settings.max_tokens,
            temperature: request.settings.temperature,
            stream,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}
