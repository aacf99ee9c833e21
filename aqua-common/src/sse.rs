//! Server-Sent Events (SSE) utilities

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const HEARTBEAT_SECS: u64 = 15;

/// Forward every [`InsightsEvent`](crate::events::InsightsEvent) on the bus to one SSE client
///
/// The stream opens with a `ConnectionStatus: connected` event. Lagged
/// receivers skip the dropped events and keep going; the stream ends when
/// the bus is dropped.
pub fn create_event_sse_stream(
    event_bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting event: {}", event_type);
                            yield Ok(Event::default()
                                .event(event_type)
                                .data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: client lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(HEARTBEAT_SECS))
            .text("heartbeat"),
    )
}
