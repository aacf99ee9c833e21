//! Statistical aggregator: scored records → chart view model
//!
//! One left-to-right pass groups records into series (by the current mode's
//! group coordinate, first-seen order, input order within a group) while
//! accumulating running statistics over the defined scores.

use crate::models::{Highlight, ScoredRecord, Series, SeriesPoint, ViewModel};
use crate::navigation::{axis_mapping, AxisMapping, NavigationMachine};
use aqua_common::VerseRef;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Welford's online mean/variance, plus min and max
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    variance_accumulator: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.variance_accumulator += delta * (value - self.mean);

        // Seeded from the first value, never from zero
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// `0.0` when nothing was pushed
    pub fn min(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    /// `0.0` when nothing was pushed
    pub fn max(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    /// `sqrt(M2 / (n - 1))`, `0.0` for fewer than two values
    pub fn sample_standard_deviation(&self) -> f64 {
        if self.count <= 1 {
            return 0.0;
        }
        (self.variance_accumulator / (self.count - 1) as f64).sqrt()
    }

    /// `sqrt(M2 / n)`, `0.0` when nothing was pushed
    pub fn population_standard_deviation(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance_accumulator / self.count as f64).sqrt()
    }
}

/// Build the view model for `records` under the machine's current state
///
/// Returns [`ViewModel::empty`] when `result_set_id` does not answer the
/// current state (a late result for a state the user already left) and in
/// modes without a chart.
pub fn build(records: &[ScoredRecord], result_set_id: &str, nav: &NavigationMachine) -> ViewModel {
    let Some(mapping) = axis_mapping(nav.mode()) else {
        return ViewModel::empty();
    };

    match nav.expected_result_set_id() {
        Ok(expected) if expected == result_set_id => {}
        Ok(expected) => {
            debug!(
                received = %result_set_id,
                expected = %expected,
                "Discarding stale result set"
            );
            return ViewModel::empty();
        }
        Err(_) => return ViewModel::empty(),
    }

    let mut stats = RunningStats::new();
    let mut series: Vec<Series> = Vec::new();
    let mut series_index: HashMap<u32, usize> = HashMap::new();

    for record in records {
        let Some((group_key, independent_value)) = coordinates(record, mapping) else {
            continue;
        };

        if let Some(score) = record.finite_score() {
            stats.push(score);
        }

        let index = *series_index.entry(group_key).or_insert_with(|| {
            series.push(Series {
                label: mapping.group.label(group_key),
                group_key,
                points: Vec::new(),
            });
            series.len() - 1
        });

        series[index].points.push(SeriesPoint {
            independent_value,
            dependent_value: record.score,
            source_record: record.clone(),
        });
    }

    let highlighted = resolve_highlight(nav, mapping, &series);

    ViewModel {
        id: result_set_id.to_string(),
        series,
        min: stats.min(),
        max: stats.max(),
        mean: stats.mean(),
        standard_deviation: stats.sample_standard_deviation(),
        population_standard_deviation: stats.population_standard_deviation(),
        scored_count: stats.count(),
        highlighted,
    }
}

/// (group key, independent value) of a record, `None` if it cannot be placed
fn coordinates(record: &ScoredRecord, mapping: AxisMapping) -> Option<(u32, u32)> {
    let verse_ref = match VerseRef::parse(&record.verse_reference) {
        Ok(v) => v,
        Err(e) => {
            warn!(vref = %record.verse_reference, error = %e, "Skipping record");
            return None;
        }
    };

    let group_key = mapping.group.extract(&verse_ref);
    let independent_value = mapping.independent.extract(&verse_ref);
    match (group_key, independent_value) {
        (Some(g), Some(x)) => Some((g, x)),
        _ => {
            warn!(
                vref = %record.verse_reference,
                "Skipping record without the coordinates this view needs"
            );
            None
        }
    }
}

fn resolve_highlight(
    nav: &NavigationMachine,
    mapping: AxisMapping,
    series: &[Series],
) -> Option<Highlight> {
    let position = nav.highlight_position()?;

    // A remembered verse from another book does not belong on this chart
    if let Some(current_book) = nav.current_book_num() {
        if position.book_num != Some(current_book) {
            return None;
        }
    }

    let group_key = mapping.group.in_position(&position)?;
    let independent_value = mapping.independent.in_position(&position)?;

    series
        .iter()
        .any(|s| s.group_key == group_key)
        .then_some(Highlight {
            group_key,
            independent_value,
        })
}
