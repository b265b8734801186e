//! Retrieval capability
//!
//! The knowledge-graph index lives in a separate service. The pipeline sees
//! it only through [`Retriever`]: given a question and [`QueryParameters`] it
//! returns a block of context text (or an answer, when not asked for context
//! only).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::provider::openai::DEFAULT_TIMEOUT;

/// Errors from the retrieval service
#[derive(Error, Debug, Clone)]
pub enum RetrievalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Retriever returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failure inside an in-process retriever
    #[error("{0}")]
    Internal(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RetrievalError::InvalidResponse(e.to_string())
        } else {
            RetrievalError::Network(e.to_string())
        }
    }
}

/// Retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    /// Graph-augmented retrieval with entity and relation context
    #[serde(rename = "light")]
    Augmented,
    /// Plain chunk retrieval
    #[serde(rename = "naive")]
    Plain,
}

/// Token budgets per context section; `None` leaves the retriever default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenBudgets {
    pub text_unit: Option<usize>,
    pub node_context: Option<usize>,
    pub local_context: Option<usize>,
    pub global_context: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub mode: QueryMode,
    pub top_k: usize,
    pub budgets: TokenBudgets,
    /// Return retrieved context instead of a generated answer
    pub context_only: bool,
}

impl QueryParameters {
    /// Primary attempt
    pub fn augmented() -> Self {
        Self {
            mode: QueryMode::Augmented,
            top_k: 15,
            budgets: TokenBudgets {
                text_unit: Some(3000),
                node_context: Some(600),
                local_context: Some(3000),
                global_context: Some(3000),
            },
            context_only: false,
        }
    }

    /// Fallback attempt
    pub fn plain() -> Self {
        Self {
            mode: QueryMode::Plain,
            top_k: 15,
            budgets: TokenBudgets {
                text_unit: Some(3000),
                ..TokenBudgets::default()
            },
            context_only: false,
        }
    }

    pub fn with_context_only(mut self, context_only: bool) -> Self {
        self.context_only = context_only;
        self
    }
}

/// Anything that can turn a question into context text
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn query(&self, question: &str, params: &QueryParameters)
        -> Result<String, RetrievalError>;
}

/// Retriever backed by a query service over HTTP (`POST {base}/query`)
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    mode: QueryMode,
    top_k: usize,
    only_need_context: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_token_for_text_unit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_token_for_node_context: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_token_for_local_context: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_token_for_global_context: Option<usize>,
}

impl<'a> QueryBody<'a> {
    fn new(question: &'a str, params: &QueryParameters) -> Self {
        Self {
            query: question,
            mode: params.mode,
            top_k: params.top_k,
            only_need_context: params.context_only,
            max_token_for_text_unit: params.budgets.text_unit,
            max_token_for_node_context: params.budgets.node_context,
            max_token_for_local_context: params.budgets.local_context,
            max_token_for_global_context: params.budgets.global_context,
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    response: Option<String>,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RetrievalError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn query(
        &self,
        question: &str,
        params: &QueryParameters,
    ) -> Result<String, RetrievalError> {
        debug!(
            "Retriever query: mode={:?} top_k={} context_only={}",
            params.mode, params.top_k, params.context_only
        );

        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&QueryBody::new(question, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.response.unwrap_or_default())
    }
}
