//! Interactive session endpoints

use crate::session::{SessionSnapshot, SessionView};
use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub group_key: u32,
    pub independent_value: u32,
}

#[derive(Debug, Deserialize)]
pub struct VerseRequest {
    /// e.g. `"GEN 1:2"`
    pub verse_ref: String,
}

#[derive(Debug, Serialize)]
pub struct ZoomOutResponse {
    /// False when already at the top level
    pub moved: bool,
    pub snapshot: SessionSnapshot,
}

/// GET /session/view
pub async fn get_view(State(state): State<AppState>) -> ApiResult<Json<SessionView>> {
    Ok(Json(state.session.view().await?))
}

/// GET /session/state
pub async fn get_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

/// POST /session/select
pub async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snapshot = state
        .session
        .select(request.group_key, request.independent_value)
        .await?;
    Ok(Json(snapshot))
}

/// POST /session/zoom-out
pub async fn zoom_out(State(state): State<AppState>) -> Json<ZoomOutResponse> {
    let moved = state.session.zoom_out().await;
    Json(ZoomOutResponse {
        moved,
        snapshot: state.session.snapshot().await,
    })
}

/// POST /session/verse: the host's "verse reference changed" event
pub async fn verse_changed(
    State(state): State<AppState>,
    Json(request): Json<VerseRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    Ok(Json(state.session.verse_changed(&request.verse_ref).await?))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session/view", get(get_view))
        .route("/session/state", get(get_state))
        .route("/session/select", post(select))
        .route("/session/zoom-out", post(zoom_out))
        .route("/session/verse", post(verse_changed))
}
