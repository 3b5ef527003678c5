//! # Word Catalog
//!
//! The global, deduplicated set of words. Word text is unique and
//! case-sensitive; the `word_index` table enforces it. Words are never
//! deleted.

use crate::primitives::{MAX_TEXT_LENGTH, MAX_WORD_LENGTH};
use crate::storage::schema::{NEXT_WORD_ID, WORD_INDEX, WORDS};
use crate::storage::{WordRecord, WordStore, load, next_id, store};
use crate::types::{Result, Word, WordId, WordInfo, WordbookError};
use redb::{ReadableTable, WriteTransaction};
use tracing::debug;

impl WordStore {
    /// Insert `word`, or overwrite the definition and note of the existing
    /// row. Last write wins: `None` clears a previous value.
    pub fn upsert_word(
        &self,
        word: &str,
        definition: Option<&str>,
        note: Option<&str>,
    ) -> Result<WordId> {
        check_word(word)?;
        check_text("definition", definition)?;
        check_text("note", note)?;

        let id = self.write(|txn| {
            let record = WordRecord {
                word: word.to_string(),
                definition: definition.map(str::to_string),
                note: note.map(str::to_string),
            };
            upsert_in(txn, record, true)
        })?;
        debug!(word, id, "word upserted");
        Ok(WordId(id))
    }

    /// Look up a word by exact text.
    pub fn find_word(&self, word: &str) -> Result<Option<Word>> {
        self.read(|txn| {
            let index = txn.open_table(WORD_INDEX)?;
            let Some(id) = index.get(word)?.map(|v| v.value()) else {
                return Ok(None);
            };
            let words = txn.open_table(WORDS)?;
            let record: Option<WordRecord> = load(&words, id)?;
            Ok(record.map(|r| r.into_word(id)))
        })
    }

    /// Case-insensitive substring search over word text, in lexicographic
    /// order. Every match is returned.
    pub fn search_words(&self, keyword: &str) -> Result<Vec<Word>> {
        if keyword.trim().is_empty() {
            return Err(WordbookError::InvalidArgument(
                "search keyword must not be empty".to_string(),
            ));
        }
        let needle = keyword.to_lowercase();

        let found = self.read(|txn| {
            let index = txn.open_table(WORD_INDEX)?;
            let words = txn.open_table(WORDS)?;
            let mut found = Vec::new();
            for row in index.iter()? {
                let (key, value) = row?;
                if !key.value().to_lowercase().contains(&needle) {
                    continue;
                }
                let id = value.value();
                if let Some(record) = load::<WordRecord, _>(&words, id)? {
                    found.push(record.into_word(id));
                }
            }
            Ok(found)
        })?;
        debug!(keyword, matches = found.len(), "word search");
        Ok(found)
    }

    /// Whether a word exists in the catalog, with its current values.
    pub fn word_info(&self, word: &str) -> Result<WordInfo> {
        Ok(self.find_word(word)?.into())
    }
}

// =============================================================================
// TRANSACTION HELPERS
// =============================================================================

/// Id of `word` inside an open write transaction.
pub(crate) fn word_id_in(txn: &WriteTransaction, word: &str) -> Result<Option<u64>> {
    let index = txn.open_table(WORD_INDEX)?;
    let id = index.get(word)?.map(|v| v.value());
    Ok(id)
}

/// Insert `record` if its text is new; otherwise overwrite the stored row
/// when `overwrite` is set. Returns the word id.
pub(crate) fn upsert_in(txn: &WriteTransaction, record: WordRecord, overwrite: bool) -> Result<u64> {
    if let Some(id) = word_id_in(txn, &record.word)? {
        if overwrite {
            let mut words = txn.open_table(WORDS)?;
            store(&mut words, id, &record)?;
        }
        return Ok(id);
    }

    let id = next_id(txn, NEXT_WORD_ID)?;
    {
        let mut index = txn.open_table(WORD_INDEX)?;
        let clash = index.insert(record.word.as_str(), id)?.is_some();
        if clash {
            return Err(WordbookError::Conflict(format!(
                "word '{}' already exists",
                record.word
            )));
        }
    }
    let mut words = txn.open_table(WORDS)?;
    store(&mut words, id, &record)?;
    Ok(id)
}

// =============================================================================
// VALIDATION
// =============================================================================

pub(crate) fn check_word(word: &str) -> Result<()> {
    if word.trim().is_empty() {
        return Err(WordbookError::InvalidArgument(
            "word must not be empty".to_string(),
        ));
    }
    if word.len() > MAX_WORD_LENGTH {
        return Err(WordbookError::InvalidArgument(format!(
            "word is longer than {} bytes",
            MAX_WORD_LENGTH
        )));
    }
    Ok(())
}

pub(crate) fn check_text(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(text) if text.len() > MAX_TEXT_LENGTH => Err(WordbookError::InvalidArgument(format!(
            "{} is longer than {} bytes",
            field, MAX_TEXT_LENGTH
        ))),
        _ => Ok(()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
