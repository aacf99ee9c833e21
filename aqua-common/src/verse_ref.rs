//! Canonical scripture references
//!
//! Assessment results are keyed by locator strings such as `"GEN 1:2"`.
//! Chapter-aggregated results carry chapter-only locators (`"GEN 1"`).
//! Book numbers follow the 66-book protestant canon order, `GEN` = 1 .. `REV` = 66.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// (book id, English name) in canonical order
const BOOKS: [(&str, &str); 66] = [
    ("GEN", "Genesis"),
    ("EXO", "Exodus"),
    ("LEV", "Leviticus"),
    ("NUM", "Numbers"),
    ("DEU", "Deuteronomy"),
    ("JOS", "Joshua"),
    ("JDG", "Judges"),
    ("RUT", "Ruth"),
    ("1SA", "1 Samuel"),
    ("2SA", "2 Samuel"),
    ("1KI", "1 Kings"),
    ("2KI", "2 Kings"),
    ("1CH", "1 Chronicles"),
    ("2CH", "2 Chronicles"),
    ("EZR", "Ezra"),
    ("NEH", "Nehemiah"),
    ("EST", "Esther"),
    ("JOB", "Job"),
    ("PSA", "Psalms"),
    ("PRO", "Proverbs"),
    ("ECC", "Ecclesiastes"),
    ("SNG", "Song of Songs"),
    ("ISA", "Isaiah"),
    ("JER", "Jeremiah"),
    ("LAM", "Lamentations"),
    ("EZK", "Ezekiel"),
    ("DAN", "Daniel"),
    ("HOS", "Hosea"),
    ("JOL", "Joel"),
    ("AMO", "Amos"),
    ("OBA", "Obadiah"),
    ("JON", "Jonah"),
    ("MIC", "Micah"),
    ("NAM", "Nahum"),
    ("HAB", "Habakkuk"),
    ("ZEP", "Zephaniah"),
    ("HAG", "Haggai"),
    ("ZEC", "Zechariah"),
    ("MAL", "Malachi"),
    ("MAT", "Matthew"),
    ("MRK", "Mark"),
    ("LUK", "Luke"),
    ("JHN", "John"),
    ("ACT", "Acts"),
    ("ROM", "Romans"),
    ("1CO", "1 Corinthians"),
    ("2CO", "2 Corinthians"),
    ("GAL", "Galatians"),
    ("EPH", "Ephesians"),
    ("PHP", "Philippians"),
    ("COL", "Colossians"),
    ("1TH", "1 Thessalonians"),
    ("2TH", "2 Thessalonians"),
    ("1TI", "1 Timothy"),
    ("2TI", "2 Timothy"),
    ("TIT", "Titus"),
    ("PHM", "Philemon"),
    ("HEB", "Hebrews"),
    ("JAS", "James"),
    ("1PE", "1 Peter"),
    ("2PE", "2 Peter"),
    ("1JN", "1 John"),
    ("2JN", "2 John"),
    ("3JN", "3 John"),
    ("JUD", "Jude"),
    ("REV", "Revelation"),
];

/// Map a three-letter book id (case-insensitive) to its canonical number
pub fn book_id_to_number(book_id: &str) -> Option<u8> {
    BOOKS
        .iter()
        .position(|(id, _)| id.eq_ignore_ascii_case(book_id))
        .map(|idx| idx as u8 + 1)
}

/// Map a canonical book number to its three-letter id
pub fn book_number_to_id(book_num: u8) -> Option<&'static str> {
    BOOKS.get(usize::from(book_num).checked_sub(1)?).map(|(id, _)| *id)
}

pub fn book_number_to_english_name(book_num: u8) -> Option<&'static str> {
    BOOKS
        .get(usize::from(book_num).checked_sub(1)?)
        .map(|(_, name)| *name)
}

/// Parsed `BOOK C:V` locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    pub book_num: u8,
    pub chapter: u32,
    /// Absent for chapter-level locators
    pub verse: Option<u32>,
}

impl VerseRef {
    /// Parse `"GEN 1:2"` or `"GEN 1"`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("Invalid verse reference: {:?}", s));

        let mut parts = s.split_whitespace();
        let book = parts.next().ok_or_else(invalid)?;
        let location = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let book_num = book_id_to_number(book).ok_or_else(invalid)?;
        let (chapter, verse) = match location.split_once(':') {
            Some((c, v)) => (c, Some(v)),
            None => (location, None),
        };
        let chapter = chapter.parse::<u32>().map_err(|_| invalid())?;
        let verse = verse
            .map(|v| v.parse::<u32>().map_err(|_| invalid()))
            .transpose()?;

        Ok(Self {
            book_num,
            chapter,
            verse,
        })
    }

    pub fn book_id(&self) -> &'static str {
        // book_num is only ever produced from the table
        book_number_to_id(self.book_num).unwrap_or("???")
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verse {
            Some(verse) => write!(f, "{} {}:{}", self.book_id(), self.chapter, verse),
            None => write!(f, "{} {}", self.book_id(), self.chapter),
        }
    }
}

impl std::str::FromStr for VerseRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
