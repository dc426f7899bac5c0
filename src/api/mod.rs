//! HTTP layer: static mirror of the watch root plus a health probe.
//!
//! This side of the daemon shares nothing with the watch protocol except
//! the process lifetime. Every request that is not `/health` falls through
//! to the file service.

use std::path::Path;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::services::ServeDir;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Builds the static-file router rooted at the watch path.
pub fn build_router(root: &Path) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(root))
}
