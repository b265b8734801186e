//! HTTP API for the chat pipeline

pub mod auth;
pub mod middleware;
pub mod routes;
pub mod server;

pub use auth::ApiKeyAuth;
pub use middleware::AuthState;
pub use server::{build_router, ApiServer, ApiServerConfig};
