//! Log filter selection for the binary
//!
//! `RUST_LOG` wins when it holds a valid filter. Otherwise the config file's
//! `logging.level` is used, and [`DEFAULT_LOG_FILTER`] when that is invalid.

use aqua_common::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "aqua_insights=debug,tower_http=debug";

/// Directive string for a configured level
///
/// A bare level applies to this crate and to request tracing; anything with a
/// `=` or `,` is passed through untouched.
pub fn config_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        DEFAULT_LOG_FILTER.to_string()
    } else if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("aqua_insights={level},tower_http={level}")
    }
}

/// Filter for the subscriber installed by `main`
///
/// Runs before any subscriber exists, so rejected filters are reported on
/// stderr.
pub fn log_filter(rust_log: Option<&str>, logging: &LoggingConfig) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG '{}': {}", directives, e),
        }
    }

    let directives = config_directives(&logging.level);
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid logging.level '{}': {}", logging.level, e);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_covers_service_and_http() {
        assert_eq!(config_directives("warn"), "aqua_insights=warn,tower_http=warn");
        assert_eq!(config_directives(" info "), "aqua_insights=info,tower_http=info");
    }

    #[test]
    fn test_full_directives_pass_through() {
        assert_eq!(config_directives("aqua_insights=trace"), "aqua_insights=trace");
        assert_eq!(config_directives("warn,sqlx=error"), "warn,sqlx=error");
    }

    #[test]
    fn test_blank_level_uses_default() {
        assert_eq!(config_directives(""), DEFAULT_LOG_FILTER);
    }
}
