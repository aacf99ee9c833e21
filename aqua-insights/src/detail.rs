//! Verse-detail evidence: the selected record's texts as token rows

use crate::models::ScoredRecord;
use crate::navigation::{NavigationMachine, NavigationMode};
use aqua_common::{Error, Result, VerseRef};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenId {
    pub book: u8,
    pub chapter: u32,
    pub verse: u32,
    /// 1-based
    pub word: u32,
    pub sub_word: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaddedToken {
    pub token_id: TokenId,
    pub surface_text: String,
    pub training_text: String,
    pub position: u32,
    pub padding_before: String,
    pub padding_after: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokensTextRow {
    pub verse_ref: String,
    pub tokens: Vec<PaddedToken>,
}

/// Which text of the record a row set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Revision,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCorpus {
    pub source: TextSource,
    pub rows: Vec<TokensTextRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerseDetailView {
    /// e.g. `"Genesis 1:2"`
    pub title: String,
    pub record: ScoredRecord,
    pub corpora: Vec<TokenCorpus>,
}

/// Split `text` on single spaces into padded tokens; empty pieces are dropped
pub fn tokenize(verse: &VerseRef, text: &str) -> TokensTextRow {
    let tokens = text
        .split(' ')
        .filter(|t| !t.is_empty())
        .zip(1u32..)
        .map(|(surface, word)| PaddedToken {
            token_id: TokenId {
                book: verse.book_num,
                chapter: verse.chapter,
                verse: verse.verse.unwrap_or_default(),
                word,
                sub_word: 1,
            },
            surface_text: surface.to_string(),
            training_text: surface.to_string(),
            position: word,
            padding_before: String::new(),
            padding_after: " ".to_string(),
        })
        .collect();

    TokensTextRow {
        verse_ref: verse.to_string(),
        tokens,
    }
}

/// Evidence view for the machine's current `VerseDetail` state
pub fn build(nav: &NavigationMachine) -> Result<VerseDetailView> {
    let state = nav.current();
    if state.mode != NavigationMode::VerseDetail {
        return Err(Error::Logic(format!(
            "Verse detail requested in {}",
            state.mode
        )));
    }

    let record = state
        .position
        .selected_record
        .clone()
        .ok_or_else(|| Error::Logic("VerseDetail without a selected record".to_string()))?;

    // The record's own locator wins; fall back to the navigation position
    let verse = match VerseRef::parse(&record.verse_reference) {
        Ok(v) if v.verse.is_some() => v,
        _ => match nav.current_selector()? {
            crate::models::QuerySelector::VerseDetail { verse, .. } => verse,
            _ => return Err(Error::Logic("VerseDetail without a verse".to_string())),
        },
    };

    let mut corpora = Vec::new();
    for (source, text) in [
        (TextSource::Revision, record.source_text.as_deref()),
        (TextSource::Reference, record.reference_text.as_deref()),
    ] {
        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            corpora.push(TokenCorpus {
                source,
                rows: vec![tokenize(&verse, text)],
            });
        }
    }

    Ok(VerseDetailView {
        title: nav.title(),
        record,
        corpora,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavigationConfig;

    #[test]
    fn test_tokenize_numbers_words_from_one() {
        let verse = VerseRef::parse("GEN 1:2").unwrap();
        let row = tokenize(&verse, "the earth  was");
        assert_eq!(row.verse_ref, "GEN 1:2");
        assert_eq!(row.tokens.len(), 3);

        let last = &row.tokens[2];
        assert_eq!(last.surface_text, "was");
        assert_eq!(last.training_text, "was");
        assert_eq!(last.position, 3);
        assert_eq!(
            last.token_id,
            TokenId {
                book: 1,
                chapter: 1,
                verse: 2,
                word: 3,
                sub_word: 1
            }
        );
        assert_eq!(last.padding_before, "");
        assert_eq!(last.padding_after, " ");
    }

    #[test]
    fn test_detail_view_from_selected_record() {
        let mut nav = NavigationMachine::new(
            NavigationConfig { assessment_id: 3 },
            Some(VerseRef::parse("GEN 1:1").unwrap()),
        );
        let mut record = ScoredRecord::new("GEN 1:2", Some(0.4));
        record.source_text = Some("and the earth".to_string());
        nav.on_selection(1, 2, record).unwrap();

        let view = build(&nav).unwrap();
        assert_eq!(view.title, "Genesis 1:2");
        assert_eq!(view.corpora.len(), 1);
        assert_eq!(view.corpora[0].source, TextSource::Revision);
        assert_eq!(view.corpora[0].rows[0].tokens.len(), 3);
    }

    #[test]
    fn test_detail_outside_verse_detail_is_logic_error() {
        let nav = NavigationMachine::new(NavigationConfig { assessment_id: 3 }, None);
        assert!(matches!(build(&nav), Err(Error::Logic(_))));
    }
}
