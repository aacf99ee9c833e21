//! Log filter selection: RUST_LOG, then the config file's `logging.level`

mod helpers;

use aqua_common::config::LoggingConfig;
use aqua_insights::logging::log_filter;
use helpers::log_capture::LogCapture;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

fn logging(level: &str) -> LoggingConfig {
    LoggingConfig {
        level: level.to_string(),
    }
}

/// Run `emit` under a subscriber built like the binary's and return what got through
fn captured(filter: EnvFilter, emit: impl FnOnce()) -> LogCapture {
    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(capture.clone());
    tracing::subscriber::with_default(subscriber, emit);
    capture
}

#[test]
fn test_config_level_applies_without_rust_log() {
    let capture = captured(log_filter(None, &logging("warn")), || {
        tracing::debug!(target: "aqua_insights::session", "cache hit detail");
        tracing::info!(target: "aqua_insights::session", "fetching from remote");
        tracing::warn!(target: "aqua_insights::session", "store unavailable");
        tracing::warn!(target: "tower_http::trace", "slow request");
    });

    assert!(!capture.contains("cache hit detail"));
    assert!(!capture.contains("fetching from remote"));
    assert!(capture.contains("store unavailable"));
    assert!(capture.contains("slow request"));
    assert!(capture.records().iter().all(|r| r.level <= Level::WARN));
}

#[test]
fn test_rust_log_overrides_config_level() {
    let capture = captured(
        log_filter(Some("aqua_insights=debug"), &logging("error")),
        || {
            tracing::debug!(target: "aqua_insights::services", "joining in-flight resolution");
        },
    );
    assert!(capture.contains("joining in-flight resolution"));
}

#[test]
fn test_blank_rust_log_falls_back_to_config() {
    let capture = captured(log_filter(Some("  "), &logging("error")), || {
        tracing::warn!(target: "aqua_insights::api", "degraded store");
        tracing::error!(target: "aqua_insights::api", "transport failed");
    });
    assert!(!capture.contains("degraded store"));
    assert!(capture.contains("transport failed"));
}

#[test]
fn test_full_directive_string_in_config() {
    let capture = captured(
        log_filter(None, &logging("aqua_insights=error,tower_http=info")),
        || {
            tracing::warn!(target: "aqua_insights::navigation", "navigation warning");
            tracing::info!(target: "tower_http::trace", "request finished");
        },
    );
    assert!(!capture.contains("navigation warning"));
    assert!(capture.contains("request finished"));
}

#[test]
fn test_invalid_config_level_uses_default_filter() {
    let capture = captured(log_filter(None, &logging("aqua_insights=loudest")), || {
        tracing::debug!(target: "aqua_insights::aggregator", "default filter debug");
        tracing::trace!(target: "aqua_insights::aggregator", "default filter trace");
    });
    assert!(capture.contains("default filter debug"));
    assert!(!capture.contains("default filter trace"));
}
