//! # AQuA Common Library
//!
//! Shared code for the AQuA insights workspace including:
//! - Error taxonomy (transport, persistence, logic)
//! - Configuration resolution
//! - Canonical scripture references (book/chapter/verse)
//! - Event types and the broadcast event bus
//! - SQLite pool initialisation

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod verse_ref;

pub use error::{Error, Result};
pub use verse_ref::VerseRef;
