//! Server-Sent Events: navigation, verse and fetch notifications

use crate::AppState;
use aqua_common::sse::create_event_sse_stream;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_event_sse_stream(&state.event_bus, "aqua-insights")
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
