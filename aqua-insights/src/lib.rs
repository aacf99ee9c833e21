//! aqua-insights library interface
//!
//! Cached assessment-result fetching, drill-down navigation and chart view
//! models, plus the axum surface that hosts them.

pub mod aggregator;
pub mod api;
pub mod detail;
pub mod error;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod persistence;
pub mod services;
pub mod session;
pub mod transport;

pub use crate::error::{ApiError, ApiResult};

use aqua_common::config::InsightsConfig;
use aqua_common::events::EventBus;
use aqua_common::{Error, Result};
use axum::Router;
use chrono::{DateTime, Utc};
use navigation::NavigationConfig;
use persistence::SqlitePersist;
use services::{CacheSettings, ResultCacheService};
use session::InsightsSession;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use transport::HttpTransport;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<InsightsSession>,
    pub cache: ResultCacheService,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(session: Arc<InsightsSession>, cache: ResultCacheService, event_bus: EventBus) -> Self {
        Self {
            session,
            cache,
            event_bus,
            startup_time: Utc::now(),
        }
    }

    /// Wire the production stack: SQLite store, HTTP transport, session
    pub async fn from_config(config: &InsightsConfig, event_bus: EventBus) -> Result<Self> {
        let assessment_id = config.assessment_id.ok_or_else(|| {
            Error::Config(format!(
                "assessment_id not configured (--assessment-id or {})",
                aqua_common::config::ENV_ASSESSMENT_ID
            ))
        })?;

        let cache = build_cache_service(config, Some(event_bus.clone())).await?;
        let session = InsightsSession::new(
            NavigationConfig { assessment_id },
            None,
            cache.clone(),
            Some(event_bus.clone()),
        );

        Ok(Self::new(Arc::new(session), cache, event_bus))
    }
}

/// Result cache over SQLite in the configured root folder and the REST transport
pub async fn build_cache_service(
    config: &InsightsConfig,
    event_bus: Option<EventBus>,
) -> Result<ResultCacheService> {
    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = aqua_common::db::init_database(&db_path).await?;

    let transport = HttpTransport::new()?;
    info!(base_uri = %config.base_uri, policy = ?config.cache_policy, "Result cache ready");

    Ok(ResultCacheService::new(
        CacheSettings::from_config(config),
        Arc::new(transport),
        Arc::new(SqlitePersist::new(pool)),
        event_bus,
    ))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::result_routes())
        .merge(api::session_routes())
        .merge(api::event_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
