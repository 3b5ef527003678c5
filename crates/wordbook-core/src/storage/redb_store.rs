//! # Redb Store
//!
//! The single data-access boundary of the Wordbook. Catalog, registry and
//! membership operations are `impl WordStore` blocks in their own modules;
//! each of them runs inside exactly one write (or read) transaction opened
//! through [`WordStore::write`] / [`WordStore::read`].
//!
//! redb allows a table to be opened only once per write transaction, so the
//! helpers here take already-open tables instead of opening their own.

use super::records::{decode, encode};
use super::schema::{
    ENTRIES, ENTRY_INDEX, METADATA, NOTEBOOKS, WORD_INDEX, WORDS, ensure_schema,
};
use crate::config::StoreOptions;
use crate::types::{Result, StoreStats};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A disk-backed word/notebook store using redb.
pub struct WordStore {
    db: Database,
    path: PathBuf,
    options: StoreOptions,
}

impl std::fmt::Debug for WordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl WordStore {
    /// Open or create a store at the given database path with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, StoreOptions::default())
    }

    /// Open or create a store with explicit options.
    pub fn with_options(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)?;
        ensure_schema(&db)?;
        debug!(path = %path.display(), "store opened");
        Ok(Self { db, path, options })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row counts of the three primary tables.
    pub fn stats(&self) -> Result<StoreStats> {
        self.read(|txn| {
            Ok(StoreStats {
                notebooks: txn.open_table(NOTEBOOKS)?.len()?,
                words: txn.open_table(WORDS)?.len()?,
                entries: txn.open_table(ENTRIES)?.len()?,
            })
        })
    }

    /// Write a consistent copy of the whole database to `dest`.
    ///
    /// Every table is read from one read transaction, so concurrent writers
    /// never leave the copy half-updated. `dest` must not exist yet.
    pub fn snapshot_to(&self, dest: impl AsRef<Path>) -> Result<StoreStats> {
        let dest = dest.as_ref();
        let target = Database::create(dest)?;
        let src = self.db.begin_read()?;
        let out = target.begin_write()?;
        {
            for def in [WORDS, NOTEBOOKS, ENTRIES] {
                let from = src.open_table(def)?;
                let mut to = out.open_table(def)?;
                for row in from.iter()? {
                    let (key, value) = row?;
                    to.insert(key.value(), value.value())?;
                }
            }

            let from = src.open_table(WORD_INDEX)?;
            let mut to = out.open_table(WORD_INDEX)?;
            for row in from.iter()? {
                let (key, value) = row?;
                to.insert(key.value(), value.value())?;
            }

            let from = src.open_table(ENTRY_INDEX)?;
            let mut to = out.open_table(ENTRY_INDEX)?;
            for row in from.iter()? {
                let (key, value) = row?;
                to.insert(key.value(), value.value())?;
            }

            let from = src.open_table(METADATA)?;
            let mut to = out.open_table(METADATA)?;
            for row in from.iter()? {
                let (key, value) = row?;
                to.insert(key.value(), value.value())?;
            }
        }
        out.commit()?;

        let stats = StoreStats {
            notebooks: src.open_table(NOTEBOOKS)?.len()?,
            words: src.open_table(WORDS)?.len()?,
            entries: src.open_table(ENTRIES)?.len()?,
        };
        debug!(dest = %dest.display(), ?stats, "snapshot written");
        Ok(stats)
    }

    /// Run `f` in one write transaction, committing only if it succeeds.
    ///
    /// An error drops the transaction uncommitted, which aborts every change
    /// `f` made.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_write()?;
        let value = f(&txn)?;
        txn.commit()?;
        Ok(value)
    }

    /// Run `f` against one read transaction.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_read()?;
        f(&txn)
    }
}

// =============================================================================
// TABLE HELPERS
// =============================================================================

/// Hand out the next id stored under `key` in the metadata table.
pub(crate) fn next_id(txn: &WriteTransaction, key: &str) -> Result<u64> {
    let mut meta = txn.open_table(METADATA)?;
    let id = meta.get(key)?.map(|v| v.value()).unwrap_or(1);
    meta.insert(key, id.saturating_add(1))?;
    Ok(id)
}

/// Decode the record stored under `id`, if any.
pub(crate) fn load<T, R>(table: &R, id: u64) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(bytes) => Ok(Some(decode(bytes.value())?)),
        None => Ok(None),
    }
}

/// Encode `record` and store it under `id`.
pub(crate) fn store<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    record: &T,
) -> Result<()> {
    let bytes = encode(record)?;
    table.insert(id, bytes.as_slice())?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_store() {
        let temp = tempdir().expect("temp dir");
        let store = WordStore::open(temp.path().join("w.db")).expect("open");
        assert_eq!(store.stats().expect("stats"), StoreStats::default());
    }

    #[test]
    fn reopen_keeps_data() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("w.db");
        {
            let store = WordStore::open(&path).expect("open");
            store.create_notebook("Biology", None).expect("create");
        }
        let store = WordStore::open(&path).expect("reopen");
        assert_eq!(store.stats().expect("stats").notebooks, 1);
    }

    #[test]
    fn failed_write_is_rolled_back() {
        let temp = tempdir().expect("temp dir");
        let store = WordStore::open(temp.path().join("w.db")).expect("open");
        let result: Result<()> = store.write(|txn| {
            next_id(txn, "scratch")?;
            Err(crate::WordbookError::Conflict("forced".into()))
        });
        assert!(result.is_err());

        let first = store.write(|txn| next_id(txn, "scratch")).expect("id");
        assert_eq!(first, 1);
    }

    #[test]
    fn snapshot_copies_everything() {
        let temp = tempdir().expect("temp dir");
        let store = WordStore::open(temp.path().join("w.db")).expect("open");
        let nb = store.create_notebook("Biology", None).expect("create");
        store
            .add_word_to_notebook(nb, "cell", Some("a basic unit of life"), None)
            .expect("add");

        let copy_path = temp.path().join("copy.db");
        let stats = store.snapshot_to(&copy_path).expect("snapshot");
        assert_eq!(stats.entries, 1);

        let copy = WordStore::open(&copy_path).expect("open copy");
        assert_eq!(copy.stats().expect("stats"), stats);
        assert!(copy.find_word("cell").expect("find").is_some());
    }
}
