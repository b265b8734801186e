//! API key authentication
//!
//! Clients present the key either as `Authorization: Bearer <key>` or in an
//! `X-API-Key` header.

use axum::http::{header, HeaderMap};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidHeaderFormat,
    EmptyToken,
}

/// Static API key checker
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    key: String,
}

impl ApiKeyAuth {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Extract token from Authorization header (Bearer token)
    pub fn extract_bearer_token(auth_header: &str) -> Result<String, AuthError> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidHeaderFormat)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token.to_string())
    }

    /// Key presented by the request, preferring the Authorization header
    pub fn presented_key(headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| Self::extract_bearer_token(h).ok());

        bearer.or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
    }

    pub fn verify(&self, headers: &HeaderMap) -> bool {
        Self::presented_key(headers)
            .is_some_and(|key| constant_time_eq(key.as_bytes(), self.key.as_bytes()))
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
