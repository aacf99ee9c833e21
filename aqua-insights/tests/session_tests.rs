//! InsightsSession: drill-down flow, stale-result safety, no-data views

mod helpers;

use aqua_common::config::CachePolicy;
use aqua_common::events::{EventBus, InsightsEvent};
use aqua_common::{Error, VerseRef};
use aqua_insights::models::QuerySelector;
use aqua_insights::navigation::{NavigationConfig, NavigationMode};
use aqua_insights::persistence::MemoryPersist;
use aqua_insights::session::{InsightsSession, SessionView};
use helpers::*;
use std::sync::Arc;
use std::time::Duration;

fn chapter_selector() -> QuerySelector {
    QuerySelector::ChapterAggregate {
        assessment_id: ASSESSMENT_ID,
    }
}

fn gen_selector() -> QuerySelector {
    QuerySelector::book(ASSESSMENT_ID, "GEN").unwrap()
}

fn populated_transport() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        &chapter_selector(),
        vec![
            scored("GEN 1", Some(0.4)),
            scored("GEN 2", Some(0.6)),
            scored("EXO 1", Some(0.8)),
        ],
    );
    let mut verse = scored("GEN 1:2", Some(0.3));
    verse.source_text = Some("and the earth was".to_string());
    verse.reference_text = Some("the earth was without form".to_string());
    transport.respond(
        &gen_selector(),
        vec![scored("GEN 1:1", Some(0.1)), verse, scored("GEN 2:1", None)],
    );
    transport
}

fn session_with(
    transport: Arc<MockTransport>,
    initial: Option<&str>,
    event_bus: Option<EventBus>,
) -> Arc<InsightsSession> {
    let cache = service(transport, Arc::new(MemoryPersist::new()), CachePolicy::UntilEvicted);
    Arc::new(InsightsSession::new(
        NavigationConfig {
            assessment_id: ASSESSMENT_ID,
        },
        initial.map(|v| VerseRef::parse(v).unwrap()),
        cache,
        event_bus,
    ))
}

fn chart(view: SessionView) -> (NavigationMode, aqua_insights::models::ViewModel) {
    match view {
        SessionView::Chart {
            mode, view_model, ..
        } => (mode, view_model),
        other => panic!("expected a chart, got {:?}", other),
    }
}

#[tokio::test]
async fn test_drill_down_to_detail_and_back() {
    let session = session_with(populated_transport(), None, None);

    let (mode, books) = chart(session.view().await.unwrap());
    assert_eq!(mode, NavigationMode::ChapterOverview);
    assert_eq!(books.series.len(), 2);
    assert_eq!(books.series[0].label, "GEN");

    session.select(1, 1).await.unwrap();
    assert_eq!(session.title().await, "Genesis");

    let (mode, verses) = chart(session.view().await.unwrap());
    assert_eq!(mode, NavigationMode::VerseOverview);
    assert_eq!(verses.series.len(), 2);
    assert_eq!(verses.scored_count, 2);

    let snapshot = session.select(1, 2).await.unwrap();
    assert_eq!(snapshot.state.mode, NavigationMode::VerseDetail);
    assert_eq!(snapshot.depth, 2);
    assert_eq!(snapshot.title, "Genesis 1:2");

    match session.view().await.unwrap() {
        SessionView::Detail { title, detail } => {
            assert_eq!(title, "Genesis 1:2");
            assert_eq!(detail.corpora.len(), 2);
            assert_eq!(detail.corpora[0].rows[0].tokens.len(), 4);
            assert_eq!(detail.corpora[1].rows[0].tokens[4].surface_text, "form");
        }
        other => panic!("expected detail, got {:?}", other),
    }

    assert!(session.zoom_out().await);
    assert!(session.zoom_out().await);
    assert!(!session.zoom_out().await);
    assert_eq!(session.snapshot().await.state.mode, NavigationMode::ChapterOverview);
}

#[tokio::test]
async fn test_selection_in_detail_is_logic_error() {
    let session = session_with(populated_transport(), Some("GEN 1:1"), None);
    session.view().await.unwrap();
    session.select(1, 2).await.unwrap();

    let result = session.select(1, 1).await;
    assert!(matches!(result, Err(Error::Logic(_))));
    assert_eq!(session.snapshot().await.state.mode, NavigationMode::VerseDetail);
}

#[tokio::test]
async fn test_selecting_unrendered_point_is_not_found() {
    let session = session_with(populated_transport(), None, None);
    assert!(matches!(
        session.select(1, 1).await,
        Err(Error::NotFound(_))
    ));

    session.view().await.unwrap();
    assert!(matches!(
        session.select(66, 1).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_transport_failure_yields_no_data_view() {
    let transport = populated_transport();
    transport.set_failing(true);
    let session = session_with(transport, Some("GEN 1:1"), None);

    match session.view().await.unwrap() {
        SessionView::NoData { mode, title, message } => {
            assert_eq!(mode, NavigationMode::VerseOverview);
            assert_eq!(title, "Genesis");
            assert_eq!(message, "no data available for this view");
        }
        other => panic!("expected no-data view, got {:?}", other),
    }
    // Session state untouched
    assert_eq!(session.snapshot().await.depth, 1);
}

#[tokio::test]
async fn test_late_result_for_abandoned_state_is_discarded() {
    let transport = populated_transport();
    let gate_a = transport.gate(&gen_selector()).await;
    let session = session_with(transport.clone(), Some("GEN 1:1"), None);

    // State A: VerseOverview of GEN, fetch held at the transport
    let pending = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.view().await })
    };
    while transport.calls() < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // State B: ChapterOverview, its fetch completes first
    assert!(session.zoom_out().await);
    let (mode_b, view_b) = chart(session.view().await.unwrap());
    assert_eq!(mode_b, NavigationMode::ChapterOverview);
    assert_eq!(view_b.id, chapter_selector().cache_key());

    // A's result arrives last
    gate_a.send(()).unwrap();
    let (mode, late_view) = chart(pending.await.unwrap().unwrap());

    assert_eq!(mode, NavigationMode::ChapterOverview);
    assert_eq!(late_view.id, chapter_selector().cache_key());
    assert_eq!(late_view, view_b);
    assert!(late_view
        .series
        .iter()
        .flat_map(|s| &s.points)
        .all(|p| !p.source_record.verse_reference.contains(':')));
}

#[tokio::test]
async fn test_late_result_for_previous_book_is_discarded() {
    let transport = populated_transport();
    let exo = QuerySelector::book(ASSESSMENT_ID, "EXO").unwrap();
    transport.respond(
        &exo,
        vec![scored("EXO 1:1", Some(-1.0)), scored("EXO 1:2", Some(-3.0))],
    );
    let gate_gen = transport.gate(&gen_selector()).await;
    let session = session_with(transport.clone(), Some("GEN 1:1"), None);

    // Genesis verse overview, fetch held at the transport
    let pending = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.view().await })
    };
    while transport.calls() < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Up to the book chart and into Exodus while Genesis is still in flight
    assert!(session.zoom_out().await);
    chart(session.view().await.unwrap());
    let snapshot = session.select(2, 1).await.unwrap();
    assert_eq!(snapshot.book_id.as_deref(), Some("EXO"));
    let (mode, exo_view) = chart(session.view().await.unwrap());
    assert_eq!(mode, NavigationMode::VerseOverview);
    assert_eq!(exo_view.id, exo.cache_key());

    // Genesis arrives last and must not paint the Exodus chart
    gate_gen.send(()).unwrap();
    let (_, late_view) = chart(pending.await.unwrap().unwrap());
    assert_eq!(late_view, exo_view);
    assert_eq!(late_view.max, -1.0);
    assert!(late_view
        .series
        .iter()
        .flat_map(|s| &s.points)
        .all(|p| p.source_record.verse_reference.starts_with("EXO")));
    assert_eq!(transport.calls(), 3);

    // The abandoned Genesis fetch still filled the cache
    assert!(session.zoom_out().await);
    chart(session.view().await.unwrap());
    session.select(1, 1).await.unwrap();
    let (_, gen_view) = chart(session.view().await.unwrap());
    assert_eq!(gen_view.id, gen_selector().cache_key());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_verse_changed_reseeds_and_announces() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let session = session_with(populated_transport(), None, Some(bus));

    let snapshot = session.verse_changed("EXO 3:14").await.unwrap();
    assert_eq!(snapshot.state.mode, NavigationMode::VerseOverview);
    assert_eq!(snapshot.title, "Exodus");
    assert_eq!(snapshot.book_id.as_deref(), Some("EXO"));
    assert_eq!(snapshot.depth, 1);

    match rx.recv().await.unwrap() {
        InsightsEvent::VerseChanged { verse_ref, .. } => assert_eq!(verse_ref, "EXO 3:14"),
        other => panic!("unexpected event {:?}", other),
    }
    match rx.recv().await.unwrap() {
        InsightsEvent::NavigationChanged { mode, depth, .. } => {
            assert_eq!(mode, "VerseOverview");
            assert_eq!(depth, 1);
        }
        other => panic!("unexpected event {:?}", other),
    }

    assert!(matches!(
        session.verse_changed("not a verse").await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_highlight_survives_round_trip_through_detail() {
    let session = session_with(populated_transport(), Some("GEN 1:1"), None);
    let (_, initial) = chart(session.view().await.unwrap());
    let highlighted = initial.highlighted.unwrap();
    assert_eq!((highlighted.group_key, highlighted.independent_value), (1, 1));

    session.select(1, 2).await.unwrap();
    session.zoom_out().await;
    let (_, back) = chart(session.view().await.unwrap());
    let highlighted = back.highlighted.unwrap();
    assert_eq!((highlighted.group_key, highlighted.independent_value), (1, 2));
}
