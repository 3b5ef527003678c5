//! Whole-store zip archives.
//!
//! ## Layout
//!
//! ```text
//! wordbook.db          consistent snapshot of the database
//! covers/<file>        every regular file of the covers directory
//! ```
//!
//! ## Restore
//!
//! 1. Parse the zip (`InvalidFileType` if it is not one) and require
//!    `wordbook.db` at the root (`InvalidBackup`).
//! 2. Extract into a staging directory beside the data directory. Entries
//!    with absolute or `..` paths reject the archive; anything that is not the
//!    database or a cover is skipped. The extracted total may not exceed
//!    `MAX_EXTRACTED_SIZE`, going by the declared sizes up front and by the
//!    bytes actually written while copying.
//! 3. Open the staged database, require the primary tables, rebuild the
//!    uniqueness indexes (`InvalidDatabase` on any inconsistency).
//! 4. Copy the live data aside (best effort).
//! 5. Exchange the staged and live directories by rename, then reopen.
//!
//! Steps 1 to 4 never modify the live data directory.

use super::swap::{safety_backup, swap_in};
use super::{ArchiveExport, ImportReport};
use crate::library::Wordbook;
use crate::primitives::{
    COVERS_DIR, DB_FILE_NAME, FILE_STAMP_FORMAT, MAX_ARCHIVE_SIZE, MAX_EXTRACTED_SIZE,
};
use crate::storage::schema::validate_restored;
use crate::types::{Result, WordbookError};
use chrono::Local;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

impl Wordbook {
    /// Bundle the database and every cover image into a zip archive.
    pub fn export_archive(&self) -> Result<ArchiveExport> {
        let scratch = tempfile::tempdir()?;
        let snapshot = scratch.path().join(DB_FILE_NAME);
        let stats = self.store().snapshot_to(&snapshot)?;
        let db_bytes = fs::read(&snapshot)?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DB_FILE_NAME, options).map_err(write_error)?;
        zip.write_all(&db_bytes)?;

        let mut covers = 0usize;
        for (name, path) in cover_files(&self.layout().covers_dir())? {
            zip.start_file(format!("{}/{}", COVERS_DIR, name), options)
                .map_err(write_error)?;
            zip.write_all(&fs::read(&path)?)?;
            covers += 1;
        }
        let bytes = zip.finish().map_err(write_error)?.into_inner();

        let file_name = format!(
            "wordbook_backup_{}.zip",
            Local::now().format(FILE_STAMP_FORMAT)
        );
        info!(file = %file_name, size = bytes.len(), covers, ?stats, "archive exported");
        Ok(ArchiveExport {
            file_name,
            bytes,
            stats,
            covers,
        })
    }

    /// Replace the whole data directory with the contents of a backup
    /// archive.
    ///
    /// Callers must not run two imports against the same data directory at
    /// once; `&mut self` enforces that within one process.
    pub fn import_archive(&mut self, bytes: &[u8]) -> Result<ImportReport> {
        if bytes.len() > MAX_ARCHIVE_SIZE {
            return Err(WordbookError::InvalidArgument(format!(
                "archive exceeds {} bytes",
                MAX_ARCHIVE_SIZE
            )));
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| WordbookError::InvalidFileType(format!("not a zip archive: {}", e)))?;
        if !archive.file_names().any(|name| name == DB_FILE_NAME) {
            return Err(WordbookError::InvalidBackup(format!(
                "archive has no {} at its root",
                DB_FILE_NAME
            )));
        }

        let layout = self.layout().clone();
        let stamp = Local::now().format(FILE_STAMP_FORMAT).to_string();
        let root_name = layout
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wordbook".to_string());
        fs::create_dir_all(layout.parent())?;
        let staging = tempfile::Builder::new()
            .prefix(&format!("{}.import-", root_name))
            .tempdir_in(layout.parent())?;

        let (covers, skipped) = extract(&mut archive, staging.path(), MAX_EXTRACTED_SIZE)?;
        let stats = validate_restored(&staging.path().join(DB_FILE_NAME))?;
        debug!(?stats, covers, skipped = skipped.len(), "archive staged");

        let safety = if self.config().options.keep_safety_backups && layout.db_path().exists() {
            safety_backup(&layout, self.store(), &stamp)
        } else {
            None
        };

        let staged = staging.keep();
        let old = match swap_in(&layout, &staged, &stamp) {
            Ok(old) => old,
            Err(e) => {
                if !matches!(e, WordbookError::PartialImport(_)) {
                    discard(&staged);
                }
                return Err(e);
            }
        };

        self.reopen()?;
        if let Some(old) = old {
            discard(&old);
        }

        info!(?stats, covers, safety_backup = ?safety, "archive imported");
        Ok(ImportReport {
            stats,
            covers,
            skipped,
            safety_backup: safety,
        })
    }
}

/// `(file name, path)` of every regular file in the covers directory, sorted
/// by name. A missing directory has no covers.
fn cover_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Where an archive entry goes inside the staging directory.
enum Target {
    Database,
    Cover(String),
    Skip,
}

fn classify(path: &Path) -> Target {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    match parts.as_slice() {
        [name] if *name == DB_FILE_NAME => Target::Database,
        [dir, name] if *dir == COVERS_DIR => Target::Cover((*name).to_string()),
        _ => Target::Skip,
    }
}

/// Sum of the uncompressed sizes the archive's entries declare.
fn declared_size<R>(archive: &mut ZipArchive<R>) -> Result<u64>
where
    R: Read + std::io::Seek,
{
    let mut total = 0u64;
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| WordbookError::InvalidBackup(format!("unreadable entry {}: {}", i, e)))?;
        total = total.saturating_add(entry.size());
    }
    Ok(total)
}

/// Extract the database and covers into `dest`, writing at most `limit`
/// bytes. Returns the number of covers and the names of skipped entries.
fn extract<R>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
    limit: u64,
) -> Result<(usize, Vec<String>)>
where
    R: Read + std::io::Seek,
{
    let declared = declared_size(archive)?;
    if declared > limit {
        return Err(WordbookError::InvalidBackup(format!(
            "archive expands to {} bytes, more than the {} allowed",
            declared, limit
        )));
    }

    let covers_dir = dest.join(COVERS_DIR);
    fs::create_dir_all(&covers_dir)?;

    let mut remaining = limit;
    let mut covers = 0usize;
    let mut skipped = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| WordbookError::InvalidBackup(format!("unreadable entry {}: {}", i, e)))?;
        let name = entry.name().to_string();
        let Some(path) = entry.enclosed_name() else {
            return Err(WordbookError::InvalidBackup(format!(
                "entry '{}' has an unsafe path",
                name
            )));
        };
        if entry.is_dir() {
            continue;
        }

        let out_path = match classify(&path) {
            Target::Database => dest.join(DB_FILE_NAME),
            Target::Cover(file) => {
                covers += 1;
                covers_dir.join(file)
            }
            Target::Skip => {
                warn!(entry = %name, "skipping unrelated archive entry");
                skipped.push(name);
                continue;
            }
        };
        let mut out = fs::File::create(&out_path)?;
        let written = std::io::copy(
            &mut (&mut entry).take(remaining.saturating_add(1)),
            &mut out,
        )
        .map_err(|e| WordbookError::InvalidBackup(format!("entry '{}' is corrupt: {}", name, e)))?;
        if written > remaining {
            return Err(WordbookError::InvalidBackup(format!(
                "entry '{}' expands past the {} byte limit",
                name, limit
            )));
        }
        remaining -= written;
    }
    Ok((covers, skipped))
}

fn write_error(e: zip::result::ZipError) -> WordbookError {
    WordbookError::Io(format!("writing archive: {}", e))
}

fn discard(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(path = %dir.display(), error = %e, "could not remove directory");
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreConfig, StoreOptions};
    use crate::types::Page;
    use tempfile::{TempDir, tempdir};

    fn open_book() -> (TempDir, Wordbook) {
        let temp = tempdir().expect("temp dir");
        let book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
        (temp, book)
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start");
            zip.write_all(bytes).expect("write");
        }
        zip.finish().expect("finish").into_inner()
    }

    #[test]
    fn export_contains_database_and_covers() {
        let (_temp, book) = open_book();
        let nb = book.store().create_notebook("Biology", None).expect("create");
        book.save_cover(nb, "c.png", b"png").expect("cover");

        let export = book.export_archive().expect("export");
        assert!(export.file_name.starts_with("wordbook_backup_"));
        assert_eq!(export.covers, 1);

        let mut archive = ZipArchive::new(Cursor::new(export.bytes)).expect("zip");
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&DB_FILE_NAME.to_string()));
        assert!(names.iter().any(|n| n.starts_with("covers/")));
        assert!(archive.by_name(DB_FILE_NAME).expect("db").size() > 0);
    }

    #[test]
    fn export_without_covers_directory() {
        let (_temp, book) = open_book();
        fs::remove_dir_all(book.layout().covers_dir()).expect("remove covers");
        let export = book.export_archive().expect("export");
        assert_eq!(export.covers, 0);
    }

    #[test]
    fn import_rejects_non_zip() {
        let (_temp, mut book) = open_book();
        assert!(matches!(
            book.import_archive(b"definitely not a zip"),
            Err(WordbookError::InvalidFileType(_))
        ));
    }

    #[test]
    fn import_rejects_archive_without_database() {
        let (_temp, mut book) = open_book();
        let bytes = zip_of(&[("covers/a.png", b"png")]);
        assert!(matches!(
            book.import_archive(&bytes),
            Err(WordbookError::InvalidBackup(_))
        ));
    }

    #[test]
    fn import_rejects_traversal() {
        let (_temp, mut book) = open_book();
        let bytes = zip_of(&[(DB_FILE_NAME, b"x"), ("../escape.txt", b"x")]);
        assert!(matches!(
            book.import_archive(&bytes),
            Err(WordbookError::InvalidBackup(_))
        ));
    }

    #[test]
    fn extraction_is_capped_by_declared_size() {
        let bytes = zip_of(&[(DB_FILE_NAME, &[0u8; 4096]), ("covers/a.png", b"png")]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let dest = tempdir().expect("temp dir");

        assert!(matches!(
            extract(&mut archive, dest.path(), 1024),
            Err(WordbookError::InvalidBackup(_))
        ));
        assert!(!dest.path().join(DB_FILE_NAME).exists());
    }

    #[test]
    fn extraction_counts_every_entry_against_the_cap() {
        let bytes = zip_of(&[
            (DB_FILE_NAME, &[0u8; 600]),
            ("covers/a.png", &[1u8; 600]),
        ]);
        let dest = tempdir().expect("temp dir");

        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).expect("zip");
        assert!(extract(&mut archive, dest.path(), 1000).is_err());

        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let (covers, skipped) = extract(&mut archive, dest.path(), 1200).expect("extract");
        assert_eq!(covers, 1);
        assert!(skipped.is_empty());
        assert_eq!(
            fs::metadata(dest.path().join(DB_FILE_NAME)).expect("db").len(),
            600
        );
    }

    #[test]
    fn invalid_database_leaves_live_store_untouched() {
        let (temp, mut book) = open_book();
        let nb = book.store().create_notebook("Biology", None).expect("create");
        book.store()
            .add_word_to_notebook(nb, "cell", None, None)
            .expect("add");

        let bytes = zip_of(&[(DB_FILE_NAME, b"garbage bytes")]);
        assert!(matches!(
            book.import_archive(&bytes),
            Err(WordbookError::InvalidDatabase(_))
        ));
        assert_eq!(
            book.store().list_words(nb, Page::all()).expect("list").total,
            1
        );
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .expect("dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n != "data")
            .collect();
        assert!(leftovers.is_empty(), "unexpected {:?}", leftovers);
    }

    #[test]
    fn import_replaces_data_and_keeps_safety_backup() {
        let (_source_temp, source) = open_book();
        let nb = source.store().create_notebook("Biology", None).expect("create");
        source
            .store()
            .add_word_to_notebook(nb, "cell", Some("a basic unit of life"), None)
            .expect("add");
        source.save_cover(nb, "c.jpg", b"jpeg").expect("cover");
        let export = source.export_archive().expect("export");

        let (_temp, mut book) = open_book();
        book.store().create_notebook("Scratch", None).expect("create");
        let report = book.import_archive(&export.bytes).expect("import");

        assert_eq!(report.stats.words, 1);
        assert_eq!(report.covers, 1);
        let backup = report.safety_backup.expect("safety backup");
        assert!(backup.join(DB_FILE_NAME).is_file());

        let names: Vec<String> = book
            .store()
            .list_notebooks()
            .expect("list")
            .into_iter()
            .map(|s| s.notebook.name)
            .collect();
        assert_eq!(names, vec!["Biology"]);
        let cover = book.store().get_notebook(nb).expect("get").cover.expect("cover");
        assert!(book.cover_path(&cover).is_ok());
    }

    #[test]
    fn safety_backup_can_be_disabled() {
        let temp = tempdir().expect("temp dir");
        let source = Wordbook::open(StoreConfig::new(temp.path().join("src"))).expect("open");
        let export = source.export_archive().expect("export");

        let options = StoreOptions {
            keep_safety_backups: false,
            ..StoreOptions::default()
        };
        let mut book =
            Wordbook::open(StoreConfig::new(temp.path().join("dst")).with_options(options))
                .expect("open");
        let report = book.import_archive(&export.bytes).expect("import");
        assert!(report.safety_backup.is_none());
    }

    #[test]
    fn unrelated_entries_are_skipped() {
        let temp = tempdir().expect("temp dir");
        let source = Wordbook::open(StoreConfig::new(temp.path().join("src"))).expect("open");
        let export = source.export_archive().expect("export");

        let mut archive = ZipArchive::new(Cursor::new(export.bytes)).expect("zip");
        let mut db = Vec::new();
        archive
            .by_name(DB_FILE_NAME)
            .expect("db")
            .read_to_end(&mut db)
            .expect("read");
        let bytes = zip_of(&[(DB_FILE_NAME, &db), ("notes/readme.txt", b"hi")]);

        let mut book = Wordbook::open(StoreConfig::new(temp.path().join("dst"))).expect("open");
        let report = book.import_archive(&bytes).expect("import");
        assert_eq!(report.skipped, vec!["notes/readme.txt".to_string()]);
    }
}
