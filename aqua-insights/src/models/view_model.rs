//! Chart-ready view model

use super::ScoredRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Chapter number (book-level chart) or verse number (chapter-level chart)
    pub independent_value: u32,
    /// `None` renders as a gap
    pub dependent_value: Option<f64>,
    pub source_record: ScoredRecord,
}

/// One chart series: all points sharing a group key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    /// Book number or chapter number
    pub group_key: u32,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub group_key: u32,
    pub independent_value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// `result_set_id` of the records rendered, empty for the empty model
    pub id: String,
    pub series: Vec<Series>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample deviation, divides by n - 1
    pub standard_deviation: f64,
    /// Divides by n
    pub population_standard_deviation: f64,
    /// Number of records that contributed to the statistics
    pub scored_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<Highlight>,
}

impl ViewModel {
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            series: Vec::new(),
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            standard_deviation: 0.0,
            population_standard_deviation: 0.0,
            scored_count: 0,
            highlighted: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.series.is_empty()
    }

    /// Point at chart coordinates, if rendered
    pub fn point(&self, group_key: u32, independent_value: u32) -> Option<&SeriesPoint> {
        self.series
            .iter()
            .find(|s| s.group_key == group_key)?
            .points
            .iter()
            .find(|p| p.independent_value == independent_value)
    }
}
