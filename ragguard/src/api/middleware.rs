//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::auth::ApiKeyAuth;

/// Authentication state shared across requests; `None` disables auth
#[derive(Clone, Default)]
pub struct AuthState {
    pub api_key: Option<Arc<ApiKeyAuth>>,
}

impl AuthState {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(|key| Arc::new(ApiKeyAuth::new(key))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Rejects requests without a matching API key
pub async fn auth_middleware(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(auth) = &state.api_key {
        if !auth.verify(request.headers()) {
            warn!("Rejected unauthenticated request to {}", request.uri().path());
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}
