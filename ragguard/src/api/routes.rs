//! API routes for the chat server

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::{DateTime, Utc};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::ChatPipeline;

/// Application state
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
}

/// Health check response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Chat request body
#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

/// Chat response body
#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// One streamed answer fragment
#[derive(Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    code: String,
}

/// Error returned by a handler, rendered as JSON
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_request",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                message: self.message,
                code: self.code.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn validated_message(payload: &ChatRequest) -> Result<&str, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    Ok(message)
}

fn session_id(payload: &ChatRequest) -> String {
    payload
        .session_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Answer one question
pub async fn chat(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = validated_message(&payload)?;
    let response = app_state.pipeline.chat(message).await;

    Ok(Json(ChatResponse {
        response,
        session_id: session_id(&payload),
    }))
}

/// Answer one question as server-sent events, ending with a `done` event
pub async fn chat_stream(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let message = validated_message(&payload)?;
    let session = session_id(&payload);

    let fragments = app_state
        .pipeline
        .chat_stream(message)
        .map(|content| Event::default().json_data(StreamChunk { content }));
    let done = stream::once(async move {
        Ok::<_, axum::Error>(Event::default().event("done").data(session))
    });

    Ok(Sse::new(fragments.chain(done)).keep_alive(KeepAlive::default()))
}
