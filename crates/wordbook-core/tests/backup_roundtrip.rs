//! # Backup Round-Trip Tests
//!
//! Export a populated data directory and restore it into an empty one; the
//! restored store must hold the same notebooks, words and memberships.

use std::collections::BTreeSet;
use std::fs;
use tempfile::tempdir;
use wordbook_core::{Page, StoreConfig, Wordbook, WordbookError};

/// `(notebook name, word, definition, note)` for every membership.
fn tuples(book: &Wordbook) -> BTreeSet<(String, String, Option<String>, Option<String>)> {
    let store = book.store();
    let mut out = BTreeSet::new();
    for summary in store.list_notebooks().expect("notebooks") {
        let page = store
            .list_words(summary.notebook.id, Page::all())
            .expect("words");
        for entry in page.words {
            out.insert((
                summary.notebook.name.clone(),
                entry.word,
                entry.definition,
                entry.note,
            ));
        }
    }
    out
}

fn populate(book: &Wordbook) {
    let store = book.store();
    let bio = store.create_notebook("Biology", None).expect("bio");
    let chem = store.create_notebook("Chemistry", None).expect("chem");
    store
        .add_word_to_notebook(bio, "cell", Some("a basic unit of life"), None)
        .expect("add");
    store
        .add_word_to_notebook(bio, "gene", None, Some("unit of heredity"))
        .expect("add");
    store
        .add_word_to_notebook(chem, "cell", Some("a basic unit of life"), None)
        .expect("add");
    store
        .add_word_to_notebook(chem, "ion", Some("charged particle"), None)
        .expect("add");
    store.upsert_word("orphan", Some("in no notebook"), None).expect("orphan");
    book.save_cover(bio, "microscope.png", b"fake png").expect("cover");
}

#[test]
fn export_then_import_reproduces_store() {
    let temp = tempdir().expect("temp dir");
    let source = Wordbook::open(StoreConfig::new(temp.path().join("source"))).expect("source");
    populate(&source);
    let export = source.export_archive().expect("export");

    let mut target = Wordbook::open(StoreConfig::new(temp.path().join("target"))).expect("target");
    let report = target.import_archive(&export.bytes).expect("import");

    assert_eq!(report.stats, source.store().stats().expect("stats"));
    assert_eq!(tuples(&target), tuples(&source));
    assert!(target.store().word_info("orphan").expect("info").exists);

    let bio = target
        .store()
        .list_notebooks()
        .expect("list")
        .into_iter()
        .find(|s| s.notebook.name == "Biology")
        .expect("biology");
    let cover = bio.notebook.cover.expect("cover ref");
    let bytes = fs::read(target.cover_path(&cover).expect("cover path")).expect("read");
    assert_eq!(bytes, b"fake png");
}

#[test]
fn restored_store_accepts_new_writes_without_duplicates() {
    let temp = tempdir().expect("temp dir");
    let source = Wordbook::open(StoreConfig::new(temp.path().join("source"))).expect("source");
    populate(&source);
    let export = source.export_archive().expect("export");

    let mut target = Wordbook::open(StoreConfig::new(temp.path().join("target"))).expect("target");
    target.import_archive(&export.bytes).expect("import");

    let store = target.store();
    let before = store.stats().expect("stats");
    let chem = store
        .list_notebooks()
        .expect("list")
        .into_iter()
        .find(|s| s.notebook.name == "Chemistry")
        .expect("chemistry")
        .notebook
        .id;
    store
        .add_word_to_notebook(chem, "ion", Some("updated"), None)
        .expect("re-add");
    let fresh = store.create_notebook("Physics", None).expect("new notebook");
    store
        .add_word_to_notebook(fresh, "cell", None, None)
        .expect("add");

    let after = store.stats().expect("stats");
    assert_eq!(after.words, before.words);
    assert_eq!(after.entries, before.entries + 1);
    assert_eq!(after.notebooks, before.notebooks + 1);
}

#[test]
fn import_twice_in_a_row() {
    let temp = tempdir().expect("temp dir");
    let source = Wordbook::open(StoreConfig::new(temp.path().join("source"))).expect("source");
    populate(&source);
    let export = source.export_archive().expect("export");

    let mut target = Wordbook::open(StoreConfig::new(temp.path().join("target"))).expect("target");
    target.import_archive(&export.bytes).expect("first import");
    let second = target.import_archive(&export.bytes).expect("second import");
    assert_eq!(tuples(&target), tuples(&source));

    let first_backup_count = fs::read_dir(temp.path())
        .expect("dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("target.backup-"))
        .count();
    assert_eq!(first_backup_count, 2);
    assert!(second.safety_backup.is_some());
}

#[test]
fn rejected_import_keeps_live_data() {
    let temp = tempdir().expect("temp dir");
    let mut book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
    populate(&book);
    let before = tuples(&book);

    let result = book.import_archive(b"PK\x03\x04 truncated");
    assert!(matches!(result, Err(WordbookError::InvalidFileType(_))));
    assert_eq!(tuples(&book), before);
}
