//! # Membership Index
//!
//! The many-to-many link between the catalog and the registry, and the
//! association operations built on it (add, list, remove, move, copy).
//!
//! A (notebook, word) pair has at most one membership. `entry_index` maps the
//! pair to its membership id, and every insert checks it inside the same write
//! transaction, so re-adding, copying or moving never creates a second row.

use crate::catalog::{check_text, check_word, upsert_in, word_id_in};
use crate::config::MergePolicy;
use crate::registry::notebook_in;
use crate::storage::schema::{ENTRIES, ENTRY_INDEX, NEXT_ENTRY_ID, NOTEBOOKS, WORDS};
use crate::storage::{
    EntryRecord, JoinedEntry, NotebookRecord, WordRecord, WordStore, display_time, from_micros,
    load, newest_first, next_id, now_micros, store,
};
use crate::types::{
    EntryId, MoveOutcome, NotebookId, Page, Result, WordEntry, WordPage, WordbookError,
};
use redb::{ReadableTable, WriteTransaction};
use tracing::debug;

impl WordStore {
    /// Add a word to a notebook, creating or updating its catalog row.
    ///
    /// The membership is created only if the word is not already in the
    /// notebook; an existing membership keeps its add time. Whether the
    /// definition and note are overwritten follows the store's
    /// [`MergePolicy`].
    pub fn add_word_to_notebook(
        &self,
        notebook: NotebookId,
        word: &str,
        definition: Option<&str>,
        note: Option<&str>,
    ) -> Result<WordEntry> {
        check_word(word)?;
        check_text("definition", definition)?;
        check_text("note", note)?;
        let options = *self.options();

        let (entry, created) = self.write(|txn| {
            let target = notebook_in(txn, notebook)?;
            let already_member = match word_id_in(txn, word)? {
                Some(word_id) => membership_in(txn, notebook.0, word_id)?.is_some(),
                None => false,
            };

            let overwrite = match options.merge_policy {
                MergePolicy::Overwrite => true,
                MergePolicy::PreserveInNotebook => !already_member,
            };
            let now = now_micros();
            let note = if options.annotate_provenance && !already_member {
                Some(with_provenance(note, &target, now))
            } else {
                note.map(str::to_string)
            };
            let record = WordRecord {
                word: word.to_string(),
                definition: definition.map(str::to_string),
                note,
            };

            let word_id = upsert_in(txn, record, overwrite)?;
            let created = insert_membership(txn, notebook.0, word_id, now)?.is_some();
            Ok((joined_in(txn, notebook.0, word_id)?, created))
        })?;
        debug!(%notebook, word, created, "word added");
        Ok(entry.into_entry())
    }

    /// One page of a notebook's words, newest membership first, with the
    /// total membership count.
    pub fn list_words(&self, notebook: NotebookId, page: Page) -> Result<WordPage> {
        let mut joined = self.read(|txn| {
            let notebooks = txn.open_table(NOTEBOOKS)?;
            if load::<NotebookRecord, _>(&notebooks, notebook.0)?.is_none() {
                return Err(WordbookError::NotebookNotFound(notebook));
            }

            let index = txn.open_table(ENTRY_INDEX)?;
            let entries = txn.open_table(ENTRIES)?;
            let words = txn.open_table(WORDS)?;
            let mut joined = Vec::new();
            for (word_id, entry_id) in memberships_of(&index, notebook.0)? {
                let entry: EntryRecord = load(&entries, entry_id)?
                    .ok_or_else(|| dangling("membership", entry_id))?;
                let word: WordRecord =
                    load(&words, word_id)?.ok_or_else(|| dangling("word", word_id))?;
                joined.push(JoinedEntry {
                    id: EntryId(entry_id),
                    add_time: entry.add_time,
                    word,
                });
            }
            Ok(joined)
        })?;

        let total = joined.len() as u64;
        newest_first(&mut joined);
        let words = page
            .apply(joined)
            .into_iter()
            .map(JoinedEntry::into_entry)
            .collect();
        Ok(WordPage { words, total })
    }

    /// Remove a word from a notebook. Returns whether a membership existed.
    ///
    /// The word must exist in the catalog; removing a word that is not in
    /// the notebook is not an error.
    pub fn remove_word(&self, notebook: NotebookId, word: &str) -> Result<bool> {
        let removed = self.write(|txn| {
            let word_id = word_id_in(txn, word)?
                .ok_or_else(|| WordbookError::WordNotFound(word.to_string()))?;
            let entry_id = {
                let mut index = txn.open_table(ENTRY_INDEX)?;
                index.remove((notebook.0, word_id))?.map(|v| v.value())
            };
            let Some(entry_id) = entry_id else {
                return Ok(false);
            };
            let mut entries = txn.open_table(ENTRIES)?;
            entries.remove(entry_id)?;
            Ok(true)
        })?;
        debug!(%notebook, word, removed, "word removed");
        Ok(removed)
    }

    /// Re-point a word's membership from `source` to `target`.
    ///
    /// The membership keeps its id and add time. If the word is already in
    /// `target`, the source membership is dropped instead and the target's
    /// membership is left as it was.
    pub fn move_word(
        &self,
        source: NotebookId,
        target: NotebookId,
        word: &str,
    ) -> Result<MoveOutcome> {
        let outcome = self.write(|txn| {
            let word_id = word_id_in(txn, word)?
                .ok_or_else(|| WordbookError::WordNotFound(word.to_string()))?;
            notebook_in(txn, target)?;

            let Some(entry_id) = membership_in(txn, source.0, word_id)? else {
                return Ok(MoveOutcome::NotMember);
            };
            if source == target {
                return Ok(MoveOutcome::Moved);
            }
            let in_target = membership_in(txn, target.0, word_id)?.is_some();

            {
                let mut index = txn.open_table(ENTRY_INDEX)?;
                index.remove((source.0, word_id))?;
                if !in_target {
                    index.insert((target.0, word_id), entry_id)?;
                }
            }

            let mut entries = txn.open_table(ENTRIES)?;
            if in_target {
                entries.remove(entry_id)?;
                return Ok(MoveOutcome::Merged);
            }
            let mut record: EntryRecord = load(&entries, entry_id)?
                .ok_or_else(|| dangling("membership", entry_id))?;
            record.notebook_id = target.0;
            store(&mut entries, entry_id, &record)?;
            Ok(MoveOutcome::Moved)
        })?;
        debug!(%source, %target, word, ?outcome, "word moved");
        Ok(outcome)
    }

    /// Add an existing word to `target` without touching its definition or
    /// note. Returns whether a new membership was created.
    pub fn copy_word(&self, target: NotebookId, word: &str) -> Result<bool> {
        let created = self.write(|txn| {
            let word_id = word_id_in(txn, word)?
                .ok_or_else(|| WordbookError::WordNotFound(word.to_string()))?;
            notebook_in(txn, target)?;
            Ok(insert_membership(txn, target.0, word_id, now_micros())?.is_some())
        })?;
        debug!(%target, word, created, "word copied");
        Ok(created)
    }
}

// =============================================================================
// TRANSACTION HELPERS
// =============================================================================

/// `(word id, membership id)` for every membership of `notebook`, in word id
/// order.
pub(crate) fn memberships_of<R>(index: &R, notebook: u64) -> Result<Vec<(u64, u64)>>
where
    R: ReadableTable<(u64, u64), u64>,
{
    let mut pairs = Vec::new();
    for row in index.range((notebook, 0u64)..=(notebook, u64::MAX))? {
        let (key, value) = row?;
        let (_, word_id) = key.value();
        pairs.push((word_id, value.value()));
    }
    Ok(pairs)
}

/// Insert the membership `(notebook, word)` unless it already exists.
/// Returns the new membership id, or `None` if the pair was present.
pub(crate) fn insert_membership(
    txn: &WriteTransaction,
    notebook: u64,
    word: u64,
    add_time: i64,
) -> Result<Option<u64>> {
    if membership_in(txn, notebook, word)?.is_some() {
        return Ok(None);
    }

    let id = next_id(txn, NEXT_ENTRY_ID)?;
    {
        let mut index = txn.open_table(ENTRY_INDEX)?;
        index.insert((notebook, word), id)?;
    }
    let mut entries = txn.open_table(ENTRIES)?;
    let record = EntryRecord {
        word_id: word,
        notebook_id: notebook,
        add_time,
    };
    store(&mut entries, id, &record)?;
    Ok(Some(id))
}

fn membership_in(txn: &WriteTransaction, notebook: u64, word: u64) -> Result<Option<u64>> {
    let index = txn.open_table(ENTRY_INDEX)?;
    let id = index.get((notebook, word))?.map(|v| v.value());
    Ok(id)
}

fn joined_in(txn: &WriteTransaction, notebook: u64, word_id: u64) -> Result<JoinedEntry> {
    let entry_id =
        membership_in(txn, notebook, word_id)?.ok_or_else(|| dangling("membership", word_id))?;
    let entries = txn.open_table(ENTRIES)?;
    let words = txn.open_table(WORDS)?;
    let entry: EntryRecord =
        load(&entries, entry_id)?.ok_or_else(|| dangling("membership", entry_id))?;
    let word: WordRecord = load(&words, word_id)?.ok_or_else(|| dangling("word", word_id))?;
    Ok(JoinedEntry {
        id: EntryId(entry_id),
        add_time: entry.add_time,
        word,
    })
}

fn with_provenance(note: Option<&str>, notebook: &NotebookRecord, now: i64) -> String {
    let line = format!(
        "added in {} at {}",
        notebook.name,
        display_time(from_micros(now))
    );
    match note {
        Some(text) if !text.trim().is_empty() => format!("{}\n{}", text, line),
        _ => line,
    }
}

fn dangling(kind: &str, id: u64) -> WordbookError {
    WordbookError::Storage(format!("{} {} is referenced but missing", kind, id))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreOptions;
    use tempfile::{TempDir, tempdir};

    fn open_store() -> (TempDir, WordStore) {
        open_with(StoreOptions::default())
    }

    fn open_with(options: StoreOptions) -> (TempDir, WordStore) {
        let temp = tempdir().expect("temp dir");
        let store = WordStore::with_options(temp.path().join("w.db"), options).expect("open");
        (temp, store)
    }

    fn words_in(store: &WordStore, notebook: NotebookId) -> Vec<String> {
        store
            .list_words(notebook, Page::all())
            .expect("list")
            .words
            .into_iter()
            .map(|w| w.word)
            .collect()
    }

    #[test]
    fn add_to_missing_notebook_fails_without_side_effects() {
        let (_temp, store) = open_store();
        let result = store.add_word_to_notebook(NotebookId(9), "cell", None, None);
        assert!(matches!(
            result,
            Err(WordbookError::NotebookNotFound(NotebookId(9)))
        ));
        assert_eq!(store.stats().expect("stats").words, 0);
    }

    #[test]
    fn re_adding_keeps_one_membership_and_its_add_time() {
        let (_temp, store) = open_store();
        let nb = store.create_notebook("Biology", None).expect("create");
        let first = store
            .add_word_to_notebook(nb, "cell", Some("old"), None)
            .expect("first");
        let second = store
            .add_word_to_notebook(nb, "cell", Some("new"), None)
            .expect("second");

        assert_eq!(first.add_time, second.add_time);
        assert_eq!(second.definition.as_deref(), Some("new"));
        let page = store.list_words(nb, Page::all()).expect("list");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn preserve_policy_keeps_values_inside_same_notebook() {
        let (_temp, store) = open_with(StoreOptions {
            merge_policy: MergePolicy::PreserveInNotebook,
            ..StoreOptions::default()
        });
        let bio = store.create_notebook("Biology", None).expect("bio");
        let chem = store.create_notebook("Chemistry", None).expect("chem");

        store
            .add_word_to_notebook(bio, "cell", Some("unit of life"), None)
            .expect("add");
        let again = store
            .add_word_to_notebook(bio, "cell", Some("changed"), None)
            .expect("re-add");
        assert_eq!(again.definition.as_deref(), Some("unit of life"));

        let elsewhere = store
            .add_word_to_notebook(chem, "cell", Some("electrochemical cell"), None)
            .expect("other notebook");
        assert_eq!(elsewhere.definition.as_deref(), Some("electrochemical cell"));
    }

    #[test]
    fn provenance_is_appended_on_new_membership_only() {
        let (_temp, store) = open_with(StoreOptions {
            annotate_provenance: true,
            ..StoreOptions::default()
        });
        let nb = store.create_notebook("Biology", None).expect("create");
        let entry = store
            .add_word_to_notebook(nb, "cell", None, Some("seen in lecture"))
            .expect("add");
        let note = entry.note.expect("note");
        assert!(note.starts_with("seen in lecture\nadded in Biology at "));

        let again = store
            .add_word_to_notebook(nb, "cell", None, Some("plain"))
            .expect("re-add");
        assert_eq!(again.note.as_deref(), Some("plain"));
    }

    #[test]
    fn list_words_is_newest_first_and_paged() {
        let (_temp, store) = open_store();
        let nb = store.create_notebook("Biology", None).expect("create");
        for word in ["a", "b", "c", "d"] {
            store
                .add_word_to_notebook(nb, word, None, None)
                .expect("add");
        }
        assert_eq!(words_in(&store, nb), vec!["d", "c", "b", "a"]);

        let page = store
            .list_words(nb, Page::new(Some(2), Some(1)))
            .expect("page");
        assert_eq!(page.total, 4);
        let names: Vec<&str> = page.words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn list_words_of_missing_notebook_fails() {
        let (_temp, store) = open_store();
        assert!(matches!(
            store.list_words(NotebookId(3), Page::all()),
            Err(WordbookError::NotebookNotFound(_))
        ));
    }

    #[test]
    fn remove_is_idempotent_but_needs_a_known_word() {
        let (_temp, store) = open_store();
        let nb = store.create_notebook("Biology", None).expect("create");
        store
            .add_word_to_notebook(nb, "cell", None, None)
            .expect("add");

        assert!(store.remove_word(nb, "cell").expect("remove"));
        assert!(!store.remove_word(nb, "cell").expect("remove again"));
        assert!(matches!(
            store.remove_word(nb, "ghost"),
            Err(WordbookError::WordNotFound(_))
        ));
        assert!(store.word_info("cell").expect("info").exists);
    }

    #[test]
    fn move_re_points_membership() {
        let (_temp, store) = open_store();
        let a = store.create_notebook("A", None).expect("a");
        let b = store.create_notebook("B", None).expect("b");
        let added = store
            .add_word_to_notebook(a, "cell", None, None)
            .expect("add");

        assert_eq!(store.move_word(a, b, "cell").expect("move"), MoveOutcome::Moved);
        assert!(words_in(&store, a).is_empty());
        let moved = store.list_words(b, Page::all()).expect("list");
        assert_eq!(moved.words.len(), 1);
        assert_eq!(moved.words[0].add_time, added.add_time);
    }

    #[test]
    fn move_into_notebook_that_has_the_word_merges() {
        let (_temp, store) = open_store();
        let a = store.create_notebook("A", None).expect("a");
        let b = store.create_notebook("B", None).expect("b");
        store
            .add_word_to_notebook(a, "cell", None, None)
            .expect("add a");
        store
            .add_word_to_notebook(b, "cell", None, None)
            .expect("add b");

        assert_eq!(store.move_word(a, b, "cell").expect("move"), MoveOutcome::Merged);
        assert!(words_in(&store, a).is_empty());
        assert_eq!(store.list_words(b, Page::all()).expect("list").total, 1);
        assert_eq!(store.stats().expect("stats").entries, 1);
    }

    #[test]
    fn move_without_membership_is_a_no_op() {
        let (_temp, store) = open_store();
        let a = store.create_notebook("A", None).expect("a");
        let b = store.create_notebook("B", None).expect("b");
        store.upsert_word("cell", None, None).expect("upsert");
        assert_eq!(
            store.move_word(a, b, "cell").expect("move"),
            MoveOutcome::NotMember
        );
        assert!(words_in(&store, b).is_empty());
    }

    #[test]
    fn move_to_missing_notebook_fails() {
        let (_temp, store) = open_store();
        let a = store.create_notebook("A", None).expect("a");
        store
            .add_word_to_notebook(a, "cell", None, None)
            .expect("add");
        assert!(matches!(
            store.move_word(a, NotebookId(77), "cell"),
            Err(WordbookError::NotebookNotFound(NotebookId(77)))
        ));
        assert_eq!(words_in(&store, a), vec!["cell"]);
    }

    #[test]
    fn copy_twice_creates_one_membership() {
        let (_temp, store) = open_store();
        let a = store.create_notebook("A", None).expect("a");
        let b = store.create_notebook("B", None).expect("b");
        store
            .add_word_to_notebook(a, "cell", Some("unit"), None)
            .expect("add");

        assert!(store.copy_word(b, "cell").expect("copy"));
        assert!(!store.copy_word(b, "cell").expect("copy again"));
        assert_eq!(store.list_words(b, Page::all()).expect("list").total, 1);
        assert_eq!(words_in(&store, a), vec!["cell"]);
        assert!(matches!(
            store.copy_word(b, "ghost"),
            Err(WordbookError::WordNotFound(_))
        ));
    }
}
