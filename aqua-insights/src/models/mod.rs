//! Data models for aqua-insights

pub mod record;
pub mod selector;
pub mod view_model;

pub use record::{ResultSet, ScoredRecord};
pub use selector::QuerySelector;
pub use view_model::{Highlight, Series, SeriesPoint, ViewModel};
