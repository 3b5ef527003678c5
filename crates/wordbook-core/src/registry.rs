//! # Notebook Registry
//!
//! Named collections of words. Names are required but not unique;
//! `created_at` is fixed at creation.
//!
//! Deleting a notebook removes its memberships in the same transaction. The
//! words themselves stay in the catalog, and cover files are left on disk.

use crate::membership::{insert_membership, memberships_of};
use crate::primitives::{COPY_SUFFIX, MAX_NOTEBOOK_NAME_LENGTH};
use crate::storage::schema::{ENTRIES, ENTRY_INDEX, NEXT_NOTEBOOK_ID, NOTEBOOKS};
use crate::storage::{
    EntryRecord, NotebookRecord, WordStore, decode, load, next_id, now_micros, store,
};
use crate::types::{Notebook, NotebookId, NotebookSummary, Result, WordbookError};
use redb::{ReadableTable, WriteTransaction};
use std::collections::BTreeMap;
use tracing::{debug, info};

impl WordStore {
    /// Create a notebook. The name is trimmed and must not be empty.
    pub fn create_notebook(&self, name: &str, cover: Option<&str>) -> Result<NotebookId> {
        let name = check_name(name)?;
        let record = NotebookRecord {
            name,
            cover: cover.map(str::to_string),
            created_at: now_micros(),
        };
        let id = self.write(|txn| insert_notebook(txn, &record))?;
        info!(id, name = %record.name, "notebook created");
        Ok(NotebookId(id))
    }

    /// Fetch one notebook.
    pub fn get_notebook(&self, id: NotebookId) -> Result<Notebook> {
        self.read(|txn| {
            let notebooks = txn.open_table(NOTEBOOKS)?;
            let record: Option<NotebookRecord> = load(&notebooks, id.0)?;
            record
                .map(|r| r.into_notebook(id.0))
                .ok_or(WordbookError::NotebookNotFound(id))
        })
    }

    /// Give a notebook a new name.
    pub fn rename_notebook(&self, id: NotebookId, new_name: &str) -> Result<Notebook> {
        let new_name = check_name(new_name)?;
        let record = self.write(|txn| {
            let mut record = notebook_in(txn, id)?;
            record.name = new_name;
            let mut notebooks = txn.open_table(NOTEBOOKS)?;
            store(&mut notebooks, id.0, &record)?;
            Ok(record)
        })?;
        debug!(%id, name = %record.name, "notebook renamed");
        Ok(record.into_notebook(id.0))
    }

    /// Set or clear the cover reference of a notebook.
    pub fn set_cover(&self, id: NotebookId, cover: Option<&str>) -> Result<()> {
        self.write(|txn| {
            let mut record = notebook_in(txn, id)?;
            record.cover = cover.map(str::to_string);
            let mut notebooks = txn.open_table(NOTEBOOKS)?;
            store(&mut notebooks, id.0, &record)
        })?;
        debug!(%id, ?cover, "cover set");
        Ok(())
    }

    /// Delete a notebook and all of its memberships. Returns how many
    /// memberships were removed.
    pub fn delete_notebook(&self, id: NotebookId) -> Result<u64> {
        let removed = self.write(|txn| {
            notebook_in(txn, id)?;

            let pairs = {
                let index = txn.open_table(ENTRY_INDEX)?;
                memberships_of(&index, id.0)?
            };
            {
                let mut index = txn.open_table(ENTRY_INDEX)?;
                for (word_id, _) in &pairs {
                    index.remove((id.0, *word_id))?;
                }
            }
            {
                let mut entries = txn.open_table(ENTRIES)?;
                for (_, entry_id) in &pairs {
                    entries.remove(*entry_id)?;
                }
            }
            let mut notebooks = txn.open_table(NOTEBOOKS)?;
            notebooks.remove(id.0)?;
            Ok(pairs.len() as u64)
        })?;
        info!(%id, removed, "notebook deleted");
        Ok(removed)
    }

    /// Copy a notebook: a new notebook named `<name> (copy)` with the same
    /// cover and one fresh membership per membership of the original,
    /// pointing at the same words.
    ///
    /// The copies are inserted oldest first so their relative order in
    /// `list_words` matches the original.
    pub fn duplicate_notebook(&self, id: NotebookId) -> Result<NotebookId> {
        let (new_id, copied) = self.write(|txn| {
            let original = notebook_in(txn, id)?;

            let mut sources: Vec<(i64, u64, u64)> = {
                let index = txn.open_table(ENTRY_INDEX)?;
                let entries = txn.open_table(ENTRIES)?;
                let mut sources = Vec::new();
                for (word_id, entry_id) in memberships_of(&index, id.0)? {
                    let record: Option<EntryRecord> = load(&entries, entry_id)?;
                    let add_time = record.map_or(0, |r| r.add_time);
                    sources.push((add_time, entry_id, word_id));
                }
                sources
            };
            sources.sort_unstable();

            let now = now_micros();
            let copy = NotebookRecord {
                name: format!("{}{}", original.name, COPY_SUFFIX),
                cover: original.cover,
                created_at: now,
            };
            let new_id = insert_notebook(txn, &copy)?;
            let mut copied = 0usize;
            for (_, _, word_id) in sources {
                if insert_membership(txn, new_id, word_id, now)?.is_some() {
                    copied += 1;
                }
            }
            Ok((new_id, copied))
        })?;
        info!(from = %id, to = new_id, copied, "notebook duplicated");
        Ok(NotebookId(new_id))
    }

    /// Every notebook with its membership count, newest first. Notebooks
    /// created in the same microsecond are ordered by id, highest first.
    pub fn list_notebooks(&self) -> Result<Vec<NotebookSummary>> {
        self.read(|txn| {
            let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
            let index = txn.open_table(ENTRY_INDEX)?;
            for row in index.iter()? {
                let (key, _) = row?;
                let (notebook_id, _) = key.value();
                *counts.entry(notebook_id).or_default() += 1;
            }

            let notebooks = txn.open_table(NOTEBOOKS)?;
            let mut summaries = Vec::new();
            for row in notebooks.iter()? {
                let (key, value) = row?;
                let id = key.value();
                let record: NotebookRecord = decode(value.value())?;
                summaries.push(NotebookSummary {
                    notebook: record.into_notebook(id),
                    word_count: counts.get(&id).copied().unwrap_or(0),
                });
            }
            summaries.sort_by(|a, b| {
                b.notebook
                    .created_at
                    .cmp(&a.notebook.created_at)
                    .then(b.notebook.id.cmp(&a.notebook.id))
            });
            Ok(summaries)
        })
    }
}

// =============================================================================
// TRANSACTION HELPERS
// =============================================================================

/// The notebook record for `id`, or `NotebookNotFound`.
pub(crate) fn notebook_in(txn: &WriteTransaction, id: NotebookId) -> Result<NotebookRecord> {
    let notebooks = txn.open_table(NOTEBOOKS)?;
    let record: Option<NotebookRecord> = load(&notebooks, id.0)?;
    record.ok_or(WordbookError::NotebookNotFound(id))
}

fn insert_notebook(txn: &WriteTransaction, record: &NotebookRecord) -> Result<u64> {
    let id = next_id(txn, NEXT_NOTEBOOK_ID)?;
    let mut notebooks = txn.open_table(NOTEBOOKS)?;
    store(&mut notebooks, id, record)?;
    Ok(id)
}

fn check_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WordbookError::InvalidArgument(
            "notebook name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NOTEBOOK_NAME_LENGTH {
        return Err(WordbookError::InvalidArgument(format!(
            "notebook name is longer than {} bytes",
            MAX_NOTEBOOK_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

// =============================================================================
// TESTS
// =============================================================================
