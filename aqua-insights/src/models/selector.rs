//! Declarative result queries
//!
//! Selectors travel as JSON objects whose shape picks the variant:
//! - `{"assessment_id": 211, "book": "GEN"}`: verse-level scores for one book
//! - `{"assessment_id": 211, "aggregateByChapter": true}`: chapter-level scores, all books
//! - `{"assessment_id": 211, "vref": "GEN 1:2"}`: a single verse
//!
//! Parsed selectors are normalised (upper-case book ids, canonical verse
//! references), so two structurally equal selectors always share a cache key.

use aqua_common::verse_ref::{book_id_to_number, book_number_to_id};
use aqua_common::{Error, Result, VerseRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSelector", into = "RawSelector")]
pub enum QuerySelector {
    Book { assessment_id: u32, book_num: u8 },
    ChapterAggregate { assessment_id: u32 },
    VerseDetail { assessment_id: u32, verse: VerseRef },
}

/// Wire shape, fields in alphabetical order
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSelector {
    #[serde(
        rename = "aggregateByChapter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    aggregate_by_chapter: Option<bool>,
    assessment_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vref: Option<String>,
}

impl TryFrom<RawSelector> for QuerySelector {
    type Error = Error;

    fn try_from(raw: RawSelector) -> Result<Self> {
        let assessment_id = raw.assessment_id;
        match (raw.aggregate_by_chapter, raw.book, raw.vref) {
            (Some(true), None, None) => Ok(QuerySelector::ChapterAggregate { assessment_id }),
            (None, Some(book), None) => QuerySelector::book(assessment_id, &book),
            (None, None, Some(vref)) => QuerySelector::verse_detail(assessment_id, &vref),
            _ => Err(Error::InvalidInput(
                "selector needs exactly one of book, vref or aggregateByChapter: true".to_string(),
            )),
        }
    }
}

impl From<QuerySelector> for RawSelector {
    fn from(selector: QuerySelector) -> Self {
        let mut raw = RawSelector {
            aggregate_by_chapter: None,
            assessment_id: selector.assessment_id(),
            book: None,
            vref: None,
        };
        match selector {
            QuerySelector::Book { book_num, .. } => {
                raw.book = book_number_to_id(book_num).map(str::to_string);
            }
            QuerySelector::ChapterAggregate { .. } => raw.aggregate_by_chapter = Some(true),
            QuerySelector::VerseDetail { verse, .. } => raw.vref = Some(verse.to_string()),
        }
        raw
    }
}

impl QuerySelector {
    /// Verse-level selector for one book, by id (`"GEN"`, case-insensitive)
    pub fn book(assessment_id: u32, book_id: &str) -> Result<Self> {
        let book_num = book_id_to_number(book_id.trim())
            .ok_or_else(|| Error::InvalidInput(format!("Unknown book id: {:?}", book_id)))?;
        Ok(QuerySelector::Book {
            assessment_id,
            book_num,
        })
    }

    /// Single-verse selector; the reference must name a verse
    pub fn verse_detail(assessment_id: u32, vref: &str) -> Result<Self> {
        let verse = VerseRef::parse(vref)?;
        if verse.verse.is_none() {
            return Err(Error::InvalidInput(format!(
                "Verse detail selector needs a verse: {:?}",
                vref
            )));
        }
        Ok(QuerySelector::VerseDetail {
            assessment_id,
            verse,
        })
    }

    pub fn assessment_id(&self) -> u32 {
        match self {
            QuerySelector::Book { assessment_id, .. }
            | QuerySelector::ChapterAggregate { assessment_id }
            | QuerySelector::VerseDetail { assessment_id, .. } => *assessment_id,
        }
    }

    /// Parse the host's JSON string form
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::InvalidInput(format!("Invalid selector: {}", e)))
    }

    /// Canonical, key-order independent encoding
    ///
    /// Doubles as the `result_set_id` of the results this selector produces.
    pub fn cache_key(&self) -> String {
        let raw = RawSelector::from(*self);
        // Inserted alphabetically: identical output whether or not the map preserves order
        let mut map = Map::new();
        if let Some(flag) = raw.aggregate_by_chapter {
            map.insert("aggregateByChapter".to_string(), Value::Bool(flag));
        }
        map.insert("assessment_id".to_string(), Value::from(raw.assessment_id));
        if let Some(book) = raw.book {
            map.insert("book".to_string(), Value::String(book));
        }
        if let Some(vref) = raw.vref {
            map.insert("vref".to_string(), Value::String(vref));
        }
        Value::Object(map).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_does_not_change_cache_key() {
        let a = QuerySelector::from_json_str(r#"{"assessment_id": 211, "book": "GEN"}"#).unwrap();
        let b = QuerySelector::from_json_str(r#"{"book": "gen", "assessment_id": 211}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), r#"{"assessment_id":211,"book":"GEN"}"#);
    }

    #[test]
    fn test_variant_shapes() {
        let agg =
            QuerySelector::from_json_str(r#"{"aggregateByChapter": true, "assessment_id": 5}"#)
                .unwrap();
        assert_eq!(agg, QuerySelector::ChapterAggregate { assessment_id: 5 });
        assert_eq!(agg.cache_key(), r#"{"aggregateByChapter":true,"assessment_id":5}"#);

        let detail =
            QuerySelector::from_json_str(r#"{"assessment_id": 5, "vref": " GEN 1:2"}"#).unwrap();
        assert_eq!(detail.cache_key(), r#"{"assessment_id":5,"vref":"GEN 1:2"}"#);

        // JSON form round-trips through serde
        let json = serde_json::to_string(&detail).unwrap();
        assert_eq!(QuerySelector::from_json_str(&json).unwrap(), detail);
    }

    #[test]
    fn test_different_selectors_have_different_keys() {
        let gen = QuerySelector::book(1, "GEN").unwrap();
        let exo = QuerySelector::book(1, "EXO").unwrap();
        let other_assessment = QuerySelector::book(2, "GEN").unwrap();
        assert_ne!(gen.cache_key(), exo.cache_key());
        assert_ne!(gen.cache_key(), other_assessment.cache_key());
    }

    #[test]
    fn test_rejects_ambiguous_or_invalid_selectors() {
        for bad in [
            r#"{"assessment_id": 1}"#,
            r#"{"assessment_id": 1, "aggregateByChapter": false}"#,
            r#"{"assessment_id": 1, "book": "GEN", "vref": "GEN 1:1"}"#,
            r#"{"assessment_id": 1, "book": "NOPE"}"#,
            r#"{"assessment_id": 1, "vref": "GEN 1"}"#,
            r#"not json"#,
        ] {
            assert!(
                matches!(QuerySelector::from_json_str(bad), Err(Error::InvalidInput(_))),
                "expected rejection for {}",
                bad
            );
        }
    }
}
