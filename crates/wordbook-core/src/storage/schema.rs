//! # Schema Manager
//!
//! Table definitions and their idempotent creation.
//!
//! ## Tables
//!
//! ```text
//! words         word id            -> WordRecord      (primary)
//! notebooks     notebook id        -> NotebookRecord  (primary)
//! word_entries  entry id           -> EntryRecord     (primary)
//! word_index    word text          -> word id         (unique word text)
//! entry_index   (notebook, word)   -> entry id        (unique membership pair)
//! metadata      key                -> u64             (id counters, schema version)
//! ```
//!
//! The two index tables are the storage-level uniqueness constraints. Every
//! insert goes through them inside the same write transaction as the primary
//! row, so a losing concurrent writer finds the key already present instead of
//! creating a duplicate. A restored database is trusted only for its primary
//! tables: the indexes are rebuilt from them by [`validate_restored`].

use super::records::{EntryRecord, NotebookRecord, WordRecord, decode};
use crate::types::{Result, StoreStats, WordbookError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableHandle};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub(crate) const WORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("words");
pub(crate) const NOTEBOOKS: TableDefinition<u64, &[u8]> = TableDefinition::new("notebooks");
pub(crate) const ENTRIES: TableDefinition<u64, &[u8]> = TableDefinition::new("word_entries");
pub(crate) const WORD_INDEX: TableDefinition<&str, u64> = TableDefinition::new("word_index");
pub(crate) const ENTRY_INDEX: TableDefinition<(u64, u64), u64> =
    TableDefinition::new("entry_index");
pub(crate) const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Tables a backup database must contain to be accepted.
pub const PRIMARY_TABLES: [&str; 3] = ["words", "notebooks", "word_entries"];

/// Version written to `metadata` on creation.
pub const SCHEMA_VERSION: u64 = 1;

pub(crate) const SCHEMA_VERSION_KEY: &str = "schema_version";
pub(crate) const NEXT_WORD_ID: &str = "next_word_id";
pub(crate) const NEXT_NOTEBOOK_ID: &str = "next_notebook_id";
pub(crate) const NEXT_ENTRY_ID: &str = "next_entry_id";

/// Create every table that does not exist yet. Safe to call on every open.
pub(crate) fn ensure_schema(db: &Database) -> Result<()> {
    let txn = db.begin_write()?;
    {
        txn.open_table(WORDS)?;
        txn.open_table(NOTEBOOKS)?;
        txn.open_table(ENTRIES)?;
        txn.open_table(WORD_INDEX)?;
        txn.open_table(ENTRY_INDEX)?;
        let mut meta = txn.open_table(METADATA)?;
        let unversioned = meta.get(SCHEMA_VERSION_KEY)?.is_none();
        if unversioned {
            meta.insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION)?;
        }
    }
    txn.commit()?;
    Ok(())
}

/// Primary tables absent from `db`, in declaration order.
pub fn missing_tables(db: &Database) -> Result<Vec<&'static str>> {
    let txn = db.begin_read()?;
    let present: BTreeSet<String> = txn
        .list_tables()?
        .map(|handle| handle.name().to_string())
        .collect();
    Ok(PRIMARY_TABLES
        .iter()
        .copied()
        .filter(|name| !present.contains(*name))
        .collect())
}

/// Open a database file taken from a backup, check it has the three primary
/// tables, and rebuild its indexes and counters from them.
///
/// Fails with `InvalidDatabase` if the file is not a database, a primary
/// table is missing, a record does not decode, two words share a text, a
/// membership pair repeats, or a membership points at a missing word or
/// notebook.
pub fn validate_restored(path: &Path) -> Result<StoreStats> {
    let db = Database::open(path)
        .map_err(|e| WordbookError::InvalidDatabase(format!("not a wordbook database: {}", e)))?;

    let missing = missing_tables(&db).map_err(as_invalid)?;
    if !missing.is_empty() {
        return Err(WordbookError::InvalidDatabase(format!(
            "missing tables: {}",
            missing.join(", ")
        )));
    }

    rebuild_indexes(&db).map_err(as_invalid)
}

fn as_invalid(e: WordbookError) -> WordbookError {
    match e {
        WordbookError::Storage(msg) | WordbookError::Serialization(msg) => {
            WordbookError::InvalidDatabase(msg)
        }
        other => other,
    }
}

fn corrupt(table: &str, id: u64, e: WordbookError) -> WordbookError {
    WordbookError::InvalidDatabase(format!("corrupt {} record {}: {}", table, id, e))
}

fn rebuild_indexes(db: &Database) -> Result<StoreStats> {
    let txn = db.begin_write()?;

    let mut word_ids: BTreeMap<String, u64> = BTreeMap::new();
    let mut known_words: BTreeSet<u64> = BTreeSet::new();
    {
        let words = txn.open_table(WORDS)?;
        for row in words.iter()? {
            let (key, value) = row?;
            let id = key.value();
            let record: WordRecord = decode(value.value()).map_err(|e| corrupt("word", id, e))?;
            if record.word.trim().is_empty() {
                return Err(WordbookError::InvalidDatabase(format!(
                    "word record {} has empty text",
                    id
                )));
            }
            if word_ids.insert(record.word.clone(), id).is_some() {
                return Err(WordbookError::InvalidDatabase(format!(
                    "duplicate word '{}'",
                    record.word
                )));
            }
            known_words.insert(id);
        }
    }

    let mut known_notebooks: BTreeSet<u64> = BTreeSet::new();
    {
        let notebooks = txn.open_table(NOTEBOOKS)?;
        for row in notebooks.iter()? {
            let (key, value) = row?;
            let id = key.value();
            let _: NotebookRecord =
                decode(value.value()).map_err(|e| corrupt("notebook", id, e))?;
            known_notebooks.insert(id);
        }
    }

    let mut pairs: BTreeMap<(u64, u64), u64> = BTreeMap::new();
    {
        let entries = txn.open_table(ENTRIES)?;
        for row in entries.iter()? {
            let (key, value) = row?;
            let id = key.value();
            let record: EntryRecord =
                decode(value.value()).map_err(|e| corrupt("membership", id, e))?;
            if !known_words.contains(&record.word_id) {
                return Err(WordbookError::InvalidDatabase(format!(
                    "membership {} references missing word {}",
                    id, record.word_id
                )));
            }
            if !known_notebooks.contains(&record.notebook_id) {
                return Err(WordbookError::InvalidDatabase(format!(
                    "membership {} references missing notebook {}",
                    id, record.notebook_id
                )));
            }
            if pairs
                .insert((record.notebook_id, record.word_id), id)
                .is_some()
            {
                return Err(WordbookError::InvalidDatabase(format!(
                    "word {} appears twice in notebook {}",
                    record.word_id, record.notebook_id
                )));
            }
        }
    }

    txn.delete_table(WORD_INDEX)?;
    txn.delete_table(ENTRY_INDEX)?;
    {
        let mut word_index = txn.open_table(WORD_INDEX)?;
        for (word, id) in &word_ids {
            word_index.insert(word.as_str(), *id)?;
        }
        let mut entry_index = txn.open_table(ENTRY_INDEX)?;
        for (pair, id) in &pairs {
            entry_index.insert(*pair, *id)?;
        }

        let after = |max: Option<&u64>| max.map_or(1, |m| m.saturating_add(1));
        let mut meta = txn.open_table(METADATA)?;
        meta.insert(NEXT_WORD_ID, after(known_words.last()))?;
        meta.insert(NEXT_NOTEBOOK_ID, after(known_notebooks.last()))?;
        meta.insert(NEXT_ENTRY_ID, after(pairs.values().max()))?;
        meta.insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION)?;
    }
    txn.commit()?;

    Ok(StoreStats {
        notebooks: known_notebooks.len() as u64,
        words: known_words.len() as u64,
        entries: pairs.len() as u64,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::encode;
    use tempfile::tempdir;

    #[test]
    fn ensure_schema_is_idempotent() {
        let temp = tempdir().expect("temp dir");
        let db = Database::create(temp.path().join("s.db")).expect("create");
        ensure_schema(&db).expect("first");
        ensure_schema(&db).expect("second");
        assert!(missing_tables(&db).expect("list").is_empty());
    }

    #[test]
    fn fresh_database_misses_all_primary_tables() {
        let temp = tempdir().expect("temp dir");
        let db = Database::create(temp.path().join("s.db")).expect("create");
        assert_eq!(missing_tables(&db).expect("list"), PRIMARY_TABLES.to_vec());
    }

    #[test]
    fn validate_rejects_non_database_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("junk.db");
        std::fs::write(&path, b"SQLite format 3\0 definitely not redb").expect("write");
        let result = validate_restored(&path);
        assert!(matches!(result, Err(WordbookError::InvalidDatabase(_))));
    }

    #[test]
    fn validate_rejects_missing_table() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("partial.db");
        {
            let db = Database::create(&path).expect("create");
            let txn = db.begin_write().expect("txn");
            txn.open_table(WORDS).expect("words");
            txn.open_table(NOTEBOOKS).expect("notebooks");
            txn.commit().expect("commit");
        }
        match validate_restored(&path) {
            Err(WordbookError::InvalidDatabase(msg)) => assert!(msg.contains("word_entries")),
            other => panic!("expected InvalidDatabase, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_dangling_membership() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("dangling.db");
        {
            let db = Database::create(&path).expect("create");
            ensure_schema(&db).expect("schema");
            let txn = db.begin_write().expect("txn");
            {
                let mut entries = txn.open_table(ENTRIES).expect("entries");
                let record = EntryRecord {
                    word_id: 7,
                    notebook_id: 9,
                    add_time: 0,
                };
                let bytes = encode(&record).expect("encode");
                entries.insert(1u64, bytes.as_slice()).expect("insert");
            }
            txn.commit().expect("commit");
        }
        let result = validate_restored(&path);
        assert!(matches!(result, Err(WordbookError::InvalidDatabase(_))));
    }

    #[test]
    fn validate_rebuilds_indexes_and_counters() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("ok.db");
        {
            let db = Database::create(&path).expect("create");
            let txn = db.begin_write().expect("txn");
            {
                let mut words = txn.open_table(WORDS).expect("words");
                let word = encode(&WordRecord {
                    word: "cell".into(),
                    definition: None,
                    note: None,
                })
                .expect("encode");
                words.insert(4u64, word.as_slice()).expect("insert");

                let mut notebooks = txn.open_table(NOTEBOOKS).expect("notebooks");
                let notebook = encode(&NotebookRecord {
                    name: "Biology".into(),
                    cover: None,
                    created_at: 0,
                })
                .expect("encode");
                notebooks.insert(2u64, notebook.as_slice()).expect("insert");

                let mut entries = txn.open_table(ENTRIES).expect("entries");
                let entry = encode(&EntryRecord {
                    word_id: 4,
                    notebook_id: 2,
                    add_time: 0,
                })
                .expect("encode");
                entries.insert(11u64, entry.as_slice()).expect("insert");
            }
            txn.commit().expect("commit");
        }

        let stats = validate_restored(&path).expect("valid");
        assert_eq!(
            stats,
            StoreStats {
                notebooks: 1,
                words: 1,
                entries: 1
            }
        );

        let db = Database::open(&path).expect("reopen");
        let txn = db.begin_read().expect("read");
        let index = txn.open_table(WORD_INDEX).expect("index");
        assert_eq!(index.get("cell").expect("get").map(|g| g.value()), Some(4));
        let meta = txn.open_table(METADATA).expect("meta");
        assert_eq!(
            meta.get(NEXT_ENTRY_ID).expect("get").map(|g| g.value()),
            Some(12)
        );
    }
}
