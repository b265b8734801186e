//! API server for the chat pipeline

use anyhow::Result;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::pipeline::ChatPipeline;

use super::middleware::{auth_middleware, AuthState};
use super::routes::{chat, chat_stream, health_check, AppState};

/// Configuration for the API server
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    /// Required key for the chat routes; auth is disabled when `None`
    pub api_key: Option<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: None,
        }
    }
}

/// Build the router: public `/health`, protected `/chat` and `/chat/stream`
pub fn build_router(pipeline: Arc<ChatPipeline>, auth_state: AuthState) -> Router {
    let app_state = Arc::new(AppState { pipeline });

    let protected = Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route_layer(from_fn_with_state(auth_state, auth_middleware))
        .with_state(app_state);

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    pipeline: Arc<ChatPipeline>,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig, pipeline: Arc<ChatPipeline>) -> Self {
        Self { config, pipeline }
    }

    pub fn router(&self) -> Router {
        build_router(
            self.pipeline.clone(),
            AuthState::new(self.config.api_key.as_deref()),
        )
    }

    /// Start the API server and serve until interrupted
    pub async fn start(self) -> Result<()> {
        if self.config.api_key.is_none() {
            warn!("API key not configured, chat routes are unauthenticated");
        }

        let app = self.router();
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.pipeline.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
