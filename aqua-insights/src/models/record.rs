//! Scored assessment records as returned by the remote endpoint

use serde::{Deserialize, Serialize};

/// One assessment result
///
/// Field names on the wire follow the remote API (`vref`, `revision_text`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Canonical `BOOK C:V` locator (`BOOK C` for chapter aggregates)
    #[serde(rename = "vref")]
    pub verse_reference: String,
    /// Absent when the verse has not been scored yet
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(
        rename = "revision_text",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_text: Option<String>,
}

impl ScoredRecord {
    pub fn new(verse_reference: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            verse_reference: verse_reference.into(),
            score,
            source_text: None,
            reference_text: None,
        }
    }

    /// Score usable for statistics (defined and finite)
    pub fn finite_score(&self) -> Option<f64> {
        self.score.filter(|s| s.is_finite())
    }
}

/// Records answering one selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub records: Vec<ScoredRecord>,
    /// Cache key of the selector that produced this set
    pub result_set_id: String,
}

impl ResultSet {
    pub fn new(records: Vec<ScoredRecord>, result_set_id: impl Into<String>) -> Self {
        Self {
            records,
            result_set_id: result_set_id.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_and_missing_fields() {
        let json = r#"{"vref":"GEN 1:1","score":0.25,"revision_text":"In the beginning","extra":1}"#;
        let record: ScoredRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.verse_reference, "GEN 1:1");
        assert_eq!(record.score, Some(0.25));
        assert_eq!(record.source_text.as_deref(), Some("In the beginning"));
        assert_eq!(record.reference_text, None);

        let unscored: ScoredRecord = serde_json::from_str(r#"{"vref":"GEN 1:2","score":null}"#).unwrap();
        assert_eq!(unscored.score, None);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["vref"], "GEN 1:1");
        assert!(back.get("reference_text").is_none());
    }

    #[test]
    fn test_finite_score_filters_nan() {
        assert_eq!(ScoredRecord::new("GEN 1:1", Some(f64::NAN)).finite_score(), None);
        assert_eq!(ScoredRecord::new("GEN 1:1", Some(-2.0)).finite_score(), Some(-2.0));
        assert_eq!(ScoredRecord::new("GEN 1:1", None).finite_score(), None);
    }
}
