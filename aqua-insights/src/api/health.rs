//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::services::CacheStats;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the result store is failing
    pub status: String,
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub cache: CacheStats,
    /// Receivers on the event bus, one per `/events` client
    pub event_subscribers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_persistence_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_persistence_error = state.cache.last_persistence_error();
    let status = if last_persistence_error.is_some() {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "aqua-insights".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        uptime_seconds,
        cache: state.cache.stats(),
        event_subscribers: state.event_bus.subscriber_count(),
        last_persistence_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
