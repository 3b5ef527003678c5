//! On-disk record layouts and their postcard codec.
//!
//! Timestamps are stored as microseconds since the Unix epoch.

use crate::primitives::DISPLAY_TIME_FORMAT;
use crate::types::{EntryId, Notebook, NotebookId, Result, Word, WordEntry, WordId};
use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WordRecord {
    pub word: String,
    pub definition: Option<String>,
    pub note: Option<String>,
}

impl WordRecord {
    pub fn into_word(self, id: u64) -> Word {
        Word {
            id: WordId(id),
            word: self.word,
            definition: self.definition,
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NotebookRecord {
    pub name: String,
    pub cover: Option<String>,
    pub created_at: i64,
}

impl NotebookRecord {
    pub fn into_notebook(self, id: u64) -> Notebook {
        Notebook {
            id: NotebookId(id),
            name: self.name,
            cover: self.cover,
            created_at: from_micros(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EntryRecord {
    pub word_id: u64,
    pub notebook_id: u64,
    pub add_time: i64,
}

/// A membership joined with its word, ready for ordering.
#[derive(Debug, Clone)]
pub(crate) struct JoinedEntry {
    pub id: EntryId,
    pub add_time: i64,
    pub word: WordRecord,
}

impl JoinedEntry {
    pub fn into_entry(self) -> WordEntry {
        WordEntry {
            word: self.word.word,
            definition: self.word.definition,
            note: self.word.note,
            add_time: from_micros(self.add_time),
        }
    }
}

/// Newest first; entries added in the same microsecond fall back to
/// insertion order, newest first.
pub(crate) fn newest_first(entries: &mut [JoinedEntry]) {
    entries.sort_by(|a, b| b.add_time.cmp(&a.add_time).then(b.id.cmp(&a.id)));
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(postcard::from_bytes(bytes)?)
}

pub(crate) fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Human-readable local time, as written into notes and spreadsheet exports.
pub(crate) fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DISPLAY_TIME_FORMAT).to_string()
}
