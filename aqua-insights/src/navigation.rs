//! Drill-down navigation state machine
//!
//! Three modes over the book → chapter → verse hierarchy:
//!
//! ```text
//! ChapterOverview --drill_in(Book)--> VerseOverview --drill_in(Verse)--> VerseDetail
//!        ^                                  |  ^                              |
//!        +------------ zoom_out ------------+  +---------- zoom_out ----------+
//! ```
//!
//! Every forward transition pushes the prior state onto the history stack and
//! every `zoom_out` pops it back, so N drill-ins followed by N zoom-outs
//! restore the starting state exactly. The history is empty exactly when the
//! current mode is `ChapterOverview`.
//!
//! Everything here is synchronous and free of I/O.

use crate::models::{QuerySelector, ScoredRecord};
use aqua_common::verse_ref::{book_number_to_english_name, book_number_to_id};
use aqua_common::{Error, Result, VerseRef};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NavigationMode {
    /// Chapter scores for every book
    ChapterOverview,
    /// Verse scores for the chapters of one book
    VerseOverview,
    /// Evidence for one verse
    VerseDetail,
}

impl NavigationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationMode::ChapterOverview => "ChapterOverview",
            NavigationMode::VerseOverview => "VerseOverview",
            NavigationMode::VerseDetail => "VerseDetail",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whichever hierarchy coordinates are meaningful for a mode
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatePosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_num: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verse_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_record: Option<ScoredRecord>,
}

impl StatePosition {
    fn from_verse_ref(verse_ref: &VerseRef) -> Self {
        Self {
            book_num: Some(verse_ref.book_num),
            chapter_num: Some(verse_ref.chapter),
            verse_num: verse_ref.verse,
            selected_record: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationState {
    pub mode: NavigationMode,
    pub position: StatePosition,
    /// Verse the host reported when the session was seeded
    pub originating_verse_ref: Option<VerseRef>,
}

impl NavigationState {
    /// Mode/position consistency
    pub fn is_well_formed(&self) -> bool {
        let p = &self.position;
        match self.mode {
            NavigationMode::ChapterOverview => {
                p.book_num.is_none() && p.chapter_num.is_none() && p.verse_num.is_none()
            }
            NavigationMode::VerseOverview => p.book_num.is_some(),
            NavigationMode::VerseDetail => {
                p.book_num.is_some()
                    && p.chapter_num.is_some()
                    && p.verse_num.is_some()
                    && p.selected_record.is_some()
            }
        }
    }
}

/// Forward transition request
#[derive(Debug, Clone, PartialEq)]
pub enum DrillTarget {
    /// From `ChapterOverview`: open one book
    Book { book_num: u8 },
    /// From `VerseOverview`: open one verse of the current book
    Verse {
        chapter_num: u32,
        verse_num: u32,
        record: ScoredRecord,
    },
}

/// A hierarchy level used as a chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Coordinate {
    Book,
    Chapter,
    Verse,
}

impl Coordinate {
    /// Value of this coordinate in a parsed reference
    pub fn extract(&self, verse_ref: &VerseRef) -> Option<u32> {
        match self {
            Coordinate::Book => Some(u32::from(verse_ref.book_num)),
            Coordinate::Chapter => Some(verse_ref.chapter),
            Coordinate::Verse => verse_ref.verse,
        }
    }

    /// Value of this coordinate in a state position
    pub fn in_position(&self, position: &StatePosition) -> Option<u32> {
        match self {
            Coordinate::Book => position.book_num.map(u32::from),
            Coordinate::Chapter => position.chapter_num,
            Coordinate::Verse => position.verse_num,
        }
    }

    /// Series label for a group key on this axis
    pub fn label(&self, value: u32) -> String {
        match self {
            Coordinate::Book => u8::try_from(value)
                .ok()
                .and_then(book_number_to_id)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            Coordinate::Chapter | Coordinate::Verse => value.to_string(),
        }
    }
}

/// Which hierarchy level feeds each chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisMapping {
    /// One series per value of this coordinate
    pub group: Coordinate,
    /// Horizontal axis within a series
    pub independent: Coordinate,
}

const AXIS_MAPPINGS: [(NavigationMode, AxisMapping); 2] = [
    (
        NavigationMode::ChapterOverview,
        AxisMapping {
            group: Coordinate::Book,
            independent: Coordinate::Chapter,
        },
    ),
    (
        NavigationMode::VerseOverview,
        AxisMapping {
            group: Coordinate::Chapter,
            independent: Coordinate::Verse,
        },
    ),
];

/// Chart axes for `mode`; `None` for modes without a chart
pub fn axis_mapping(mode: NavigationMode) -> Option<AxisMapping> {
    AXIS_MAPPINGS
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, mapping)| *mapping)
}

/// Construction-time settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationConfig {
    pub assessment_id: u32,
}

#[derive(Debug, Clone)]
pub struct NavigationMachine {
    config: NavigationConfig,
    current: NavigationState,
    history: Vec<NavigationState>,
    /// Position of the most recent verse opened in detail
    last_detail: Option<StatePosition>,
}

impl NavigationMachine {
    /// Initial state: `VerseOverview` of the verse's book when the host named
    /// a verse, `ChapterOverview` otherwise
    pub fn new(config: NavigationConfig, verse_ref: Option<VerseRef>) -> Self {
        let root = NavigationState {
            mode: NavigationMode::ChapterOverview,
            position: StatePosition::default(),
            originating_verse_ref: verse_ref,
        };

        let machine = match verse_ref {
            Some(v) => Self {
                config,
                current: NavigationState {
                    mode: NavigationMode::VerseOverview,
                    position: StatePosition {
                        book_num: Some(v.book_num),
                        ..StatePosition::default()
                    },
                    originating_verse_ref: Some(v),
                },
                history: vec![root],
                last_detail: None,
            },
            None => Self {
                config,
                current: root,
                history: Vec::new(),
                last_detail: None,
            },
        };
        machine.debug_check();
        machine
    }

    pub fn config(&self) -> NavigationConfig {
        self.config
    }

    pub fn current(&self) -> &NavigationState {
        &self.current
    }

    pub fn mode(&self) -> NavigationMode {
        self.current.mode
    }

    pub fn history(&self) -> &[NavigationState] {
        &self.history
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Forward transition; the prior state is pushed onto the history
    pub fn drill_in(&mut self, target: DrillTarget) -> Result<()> {
        let next = match (self.current.mode, target) {
            (NavigationMode::ChapterOverview, DrillTarget::Book { book_num }) => {
                if book_number_to_id(book_num).is_none() {
                    return Err(logic_error(format!("No book numbered {}", book_num)));
                }
                NavigationState {
                    mode: NavigationMode::VerseOverview,
                    position: StatePosition {
                        book_num: Some(book_num),
                        ..StatePosition::default()
                    },
                    originating_verse_ref: self.current.originating_verse_ref,
                }
            }
            (
                NavigationMode::VerseOverview,
                DrillTarget::Verse {
                    chapter_num,
                    verse_num,
                    record,
                },
            ) => NavigationState {
                mode: NavigationMode::VerseDetail,
                position: StatePosition {
                    book_num: self.current.position.book_num,
                    chapter_num: Some(chapter_num),
                    verse_num: Some(verse_num),
                    selected_record: Some(record),
                },
                originating_verse_ref: self.current.originating_verse_ref,
            },
            (mode, target) => {
                return Err(logic_error(format!(
                    "Cannot drill into {:?} from {}",
                    target, mode
                )));
            }
        };

        if next.mode == NavigationMode::VerseDetail {
            self.last_detail = Some(next.position.clone());
        }

        let prior = std::mem::replace(&mut self.current, next);
        self.history.push(prior);
        info!(
            mode = %self.current.mode,
            depth = self.history.len(),
            "Drilled in"
        );
        self.debug_check();
        Ok(())
    }

    /// Back to the previous state; `false` (no-op) at the root
    pub fn zoom_out(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                info!(
                    mode = %self.current.mode,
                    depth = self.history.len(),
                    "Zoomed out"
                );
                self.debug_check();
                true
            }
            None => false,
        }
    }

    /// Selection is only meaningful on the two chart modes
    pub fn check_selection_allowed(&self) -> Result<()> {
        match axis_mapping(self.current.mode) {
            Some(_) => Ok(()),
            None => Err(logic_error(format!(
                "Selection is not available in {}",
                self.current.mode
            ))),
        }
    }

    /// A chart point was picked: drill into it
    ///
    /// `group_key`/`independent_value` are chart coordinates under the
    /// current mode's [`AxisMapping`].
    pub fn on_selection(
        &mut self,
        group_key: u32,
        independent_value: u32,
        record: ScoredRecord,
    ) -> Result<()> {
        self.check_selection_allowed()?;

        let target = match self.current.mode {
            NavigationMode::ChapterOverview => {
                let book_num = u8::try_from(group_key)
                    .map_err(|_| logic_error(format!("No book numbered {}", group_key)))?;
                DrillTarget::Book { book_num }
            }
            _ => DrillTarget::Verse {
                chapter_num: group_key,
                verse_num: independent_value,
                record,
            },
        };
        self.drill_in(target)
    }

    /// Book id of the current state (`VerseOverview` and `VerseDetail` only)
    pub fn current_book_id(&self) -> Option<&'static str> {
        match self.current.mode {
            NavigationMode::ChapterOverview => None,
            _ => self.current.position.book_num.and_then(book_number_to_id),
        }
    }

    pub fn current_book_num(&self) -> Option<u8> {
        match self.current.mode {
            NavigationMode::ChapterOverview => None,
            _ => self.current.position.book_num,
        }
    }

    /// Position to highlight in the current chart
    ///
    /// The most recently opened verse if the user is on the way back up,
    /// otherwise the verse the session was seeded with. Does not mutate.
    pub fn highlight_position(&self) -> Option<StatePosition> {
        self.last_detail.clone().or_else(|| {
            self.current
                .originating_verse_ref
                .as_ref()
                .map(StatePosition::from_verse_ref)
        })
    }

    /// Query answering the current state
    pub fn current_selector(&self) -> Result<QuerySelector> {
        let assessment_id = self.config.assessment_id;
        let position = &self.current.position;
        match self.current.mode {
            NavigationMode::ChapterOverview => Ok(QuerySelector::ChapterAggregate { assessment_id }),
            NavigationMode::VerseOverview => {
                let book_num = position
                    .book_num
                    .ok_or_else(|| logic_error("VerseOverview without a book".to_string()))?;
                Ok(QuerySelector::Book {
                    assessment_id,
                    book_num,
                })
            }
            NavigationMode::VerseDetail => {
                let (Some(book_num), Some(chapter), Some(verse)) =
                    (position.book_num, position.chapter_num, position.verse_num)
                else {
                    return Err(logic_error("VerseDetail without a verse".to_string()));
                };
                Ok(QuerySelector::VerseDetail {
                    assessment_id,
                    verse: VerseRef {
                        book_num,
                        chapter,
                        verse: Some(verse),
                    },
                })
            }
        }
    }

    /// `result_set_id` a result set must carry to be rendered now
    pub fn expected_result_set_id(&self) -> Result<String> {
        Ok(self.current_selector()?.cache_key())
    }

    /// `""`, `"Genesis"` or `"Genesis 1:2"`
    pub fn title(&self) -> String {
        let position = &self.current.position;
        let book_name = position.book_num.and_then(book_number_to_english_name);
        match (self.current.mode, book_name) {
            (NavigationMode::ChapterOverview, _) | (_, None) => String::new(),
            (NavigationMode::VerseOverview, Some(name)) => name.to_string(),
            (NavigationMode::VerseDetail, Some(name)) => format!(
                "{} {}:{}",
                name,
                position.chapter_num.unwrap_or_default(),
                position.verse_num.unwrap_or_default()
            ),
        }
    }

    /// Start over from a new host verse
    pub fn reset_to_verse(&mut self, verse_ref: Option<VerseRef>) {
        *self = Self::new(self.config, verse_ref);
        info!(mode = %self.current.mode, "Navigation reset");
    }

    fn invariant_holds(&self) -> bool {
        let history_ok = match self.current.mode {
            NavigationMode::ChapterOverview => self.history.is_empty(),
            _ => !self.history.is_empty(),
        };
        history_ok && self.current.is_well_formed()
    }

    fn debug_check(&self) {
        debug_assert!(
            self.invariant_holds(),
            "navigation invariant broken: {:?} with history depth {}",
            self.current,
            self.history.len()
        );
    }
}

fn logic_error(message: String) -> Error {
    error!("{}", message);
    Error::Logic(message)
}
