//! Result endpoints: the host data-provider surface
//!
//! `GET /results?selector={"assessment_id":211,"book":"GEN"}` returns the
//! result set for the selector; `DELETE` with the same query evicts it.

use crate::models::{QuerySelector, ResultSet};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SelectorQuery {
    /// JSON-encoded selector
    pub selector: String,
}

/// GET /results?selector=<json>
pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<SelectorQuery>,
) -> ApiResult<Json<ResultSet>> {
    let result_set = state
        .cache
        .get_results_from_string_selector(&query.selector)
        .await?;
    Ok(Json(result_set))
}

/// DELETE /results?selector=<json>
pub async fn evict_results(
    State(state): State<AppState>,
    Query(query): Query<SelectorQuery>,
) -> ApiResult<StatusCode> {
    let selector = QuerySelector::from_json_str(&query.selector)?;
    state.cache.evict(&selector).await?;
    info!(selector = %selector.cache_key(), "Evicted via API");
    Ok(StatusCode::NO_CONTENT)
}

pub fn result_routes() -> Router<AppState> {
    Router::new().route("/results", get(get_results).delete(evict_results))
}
