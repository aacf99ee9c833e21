//! Interactive session: navigation + cached fetching + aggregation
//!
//! On every view request the current state picks a selector, the cache
//! service resolves it (possibly suspending on the network) and the result
//! is aggregated against whatever state is current *after* the fetch. A
//! result that answers a state the user has already left is dropped and the
//! view is rebuilt for the new state.

use crate::aggregator;
use crate::detail::{self, VerseDetailView};
use crate::models::ViewModel;
use crate::navigation::{NavigationConfig, NavigationMachine, NavigationMode, NavigationState};
use crate::services::ResultCacheService;
use aqua_common::events::{EventBus, InsightsEvent};
use aqua_common::{Error, Result, VerseRef};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Rebuild attempts when the state keeps moving under a fetch
const MAX_VIEW_ATTEMPTS: usize = 4;

/// What the host should render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionView {
    Chart {
        mode: NavigationMode,
        title: String,
        view_model: ViewModel,
    },
    Detail {
        title: String,
        detail: VerseDetailView,
    },
    /// Remote unavailable and nothing cached
    NoData {
        mode: NavigationMode,
        title: String,
        message: String,
    },
}

/// Current navigation state as reported to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: NavigationState,
    pub depth: usize,
    pub title: String,
    /// Book being browsed, absent on the chapter overview
    pub book_id: Option<String>,
}

pub struct InsightsSession {
    nav: RwLock<NavigationMachine>,
    cache: ResultCacheService,
    /// Most recent chart, used to resolve selections back to records
    last_view: RwLock<Option<ViewModel>>,
    event_bus: Option<EventBus>,
}

impl InsightsSession {
    pub fn new(
        config: NavigationConfig,
        initial_verse: Option<VerseRef>,
        cache: ResultCacheService,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            nav: RwLock::new(NavigationMachine::new(config, initial_verse)),
            cache,
            last_view: RwLock::new(None),
            event_bus,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        snapshot_of(&*self.nav.read().await)
    }

    pub async fn title(&self) -> String {
        self.nav.read().await.title()
    }

    /// Build the view for the current state
    pub async fn view(&self) -> Result<SessionView> {
        for attempt in 1..=MAX_VIEW_ATTEMPTS {
            let selector = {
                let nav = self.nav.read().await;
                if nav.mode() == NavigationMode::VerseDetail {
                    return Ok(SessionView::Detail {
                        title: nav.title(),
                        detail: detail::build(&nav)?,
                    });
                }
                nav.current_selector()?
            };

            // State lock released while the fetch is outstanding
            let fetched = self.cache.get_results(&selector).await;

            let nav = self.nav.read().await;
            let expected = nav.expected_result_set_id()?;
            if expected != selector.cache_key() {
                debug!(attempt, "State changed during fetch, rebuilding view");
                continue;
            }

            return match fetched {
                Ok(result_set) => {
                    let view_model =
                        aggregator::build(&result_set.records, &result_set.result_set_id, &nav);
                    *self.last_view.write().await = Some(view_model.clone());
                    Ok(SessionView::Chart {
                        mode: nav.mode(),
                        title: nav.title(),
                        view_model,
                    })
                }
                Err(Error::Transport(message)) => {
                    warn!(error = %message, "No data available for this view");
                    *self.last_view.write().await = None;
                    Ok(SessionView::NoData {
                        mode: nav.mode(),
                        title: nav.title(),
                        message: "no data available for this view".to_string(),
                    })
                }
                Err(e) => Err(e),
            };
        }

        warn!("State kept changing during fetches, returning empty view");
        let nav = self.nav.read().await;
        Ok(SessionView::Chart {
            mode: nav.mode(),
            title: nav.title(),
            view_model: ViewModel::empty(),
        })
    }

    /// Drill into the chart point at (`group_key`, `independent_value`)
    pub async fn select(&self, group_key: u32, independent_value: u32) -> Result<SessionSnapshot> {
        let mut nav = self.nav.write().await;
        nav.check_selection_allowed()?;

        let expected = nav.expected_result_set_id()?;
        let record = {
            let last_view = self.last_view.read().await;
            last_view
                .as_ref()
                .filter(|vm| vm.id == expected)
                .and_then(|vm| vm.point(group_key, independent_value))
                .map(|point| point.source_record.clone())
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "No point at ({}, {}) in the current view",
                        group_key, independent_value
                    ))
                })?
        };

        nav.on_selection(group_key, independent_value, record)?;
        self.announce_navigation(&nav);
        Ok(snapshot_of(&nav))
    }

    /// Back one level; `false` when already at the root
    pub async fn zoom_out(&self) -> bool {
        let mut nav = self.nav.write().await;
        let moved = nav.zoom_out();
        if moved {
            self.announce_navigation(&nav);
        }
        moved
    }

    /// Host reported a new current verse: start over from it
    pub async fn verse_changed(&self, verse_ref: &str) -> Result<SessionSnapshot> {
        let verse = VerseRef::parse(verse_ref)?;

        let mut nav = self.nav.write().await;
        nav.reset_to_verse(Some(verse));
        *self.last_view.write().await = None;

        info!(verse_ref = %verse, "Verse changed");
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(InsightsEvent::VerseChanged {
                verse_ref: verse.to_string(),
                timestamp: Utc::now(),
            });
        }
        self.announce_navigation(&nav);
        Ok(snapshot_of(&nav))
    }

    fn announce_navigation(&self, nav: &NavigationMachine) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(InsightsEvent::NavigationChanged {
                mode: nav.mode().to_string(),
                title: nav.title(),
                depth: nav.history_depth(),
                timestamp: Utc::now(),
            });
        }
    }
}

fn snapshot_of(nav: &NavigationMachine) -> SessionSnapshot {
    SessionSnapshot {
        state: nav.current().clone(),
        depth: nav.history_depth(),
        title: nav.title(),
        book_id: nav.current_book_id().map(str::to_string),
    }
}
