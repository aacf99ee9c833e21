//! Event types for the AQuA insights event system

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Insights event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InsightsEvent {
    /// Host reported a new current verse
    VerseChanged {
        verse_ref: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Drill-in / zoom-out moved the session to another view
    NavigationChanged {
        /// "ChapterOverview" | "VerseOverview" | "VerseDetail"
        mode: String,
        /// Human readable location, e.g. "Genesis 1:2"
        title: String,
        /// History depth after the transition
        depth: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A result set was produced for a selector
    ResultsFetched {
        result_set_id: String,
        record_count: usize,
        /// Answered from the persisted cache without a remote call
        from_cache: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl InsightsEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            InsightsEvent::VerseChanged { .. } => "VerseChanged",
            InsightsEvent::NavigationChanged { .. } => "NavigationChanged",
            InsightsEvent::ResultsFetched { .. } => "ResultsFetched",
        }
    }
}

/// Broadcast bus shared by the session, the cache service and SSE clients
///
/// # Examples
///
/// ```
/// use aqua_common::events::{EventBus, InsightsEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(InsightsEvent::VerseChanged {
///     verse_ref: "GEN 1:1".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<InsightsEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<InsightsEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: InsightsEvent) {
        let _ = self.tx.send(event);
    }

    /// Live receivers, SSE clients included
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
