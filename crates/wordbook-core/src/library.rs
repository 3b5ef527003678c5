//! # Wordbook
//!
//! The data directory as a whole: the redb store plus the covers directory.
//! Everything that touches files next to the database (cover images, backup
//! archives) goes through here; pure word/notebook operations are on
//! [`WordStore`], reachable with [`Wordbook::store`].

use crate::config::{DataLayout, StoreConfig};
use crate::primitives::{COVER_EXTENSIONS, FILE_STAMP_FORMAT, MAX_COVER_SIZE};
use crate::storage::WordStore;
use crate::types::{NotebookId, Result, WordbookError};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An open data directory.
#[derive(Debug)]
pub struct Wordbook {
    config: StoreConfig,
    layout: DataLayout,
    store: WordStore,
}

impl Wordbook {
    /// Open the data directory named by `config`, creating it (and the
    /// covers directory) if needed.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let layout = config.layout();
        fs::create_dir_all(layout.covers_dir())?;
        let store = WordStore::with_options(layout.db_path(), config.options)?;
        info!(data_dir = %layout.root().display(), "wordbook opened");
        Ok(Self {
            config,
            layout,
            store,
        })
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    // =========================================================================
    // COVER STORE
    // =========================================================================

    /// Store a cover image for a notebook and point the notebook at it.
    ///
    /// The extension of `file_name` must be one of the accepted image types.
    /// The file is written as `<notebook>_<timestamp>.<ext>`; the returned
    /// reference is that file name. The previous cover file, if any, is left
    /// in place.
    pub fn save_cover(&self, notebook: NotebookId, file_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = cover_extension(file_name)?;
        if bytes.is_empty() {
            return Err(WordbookError::InvalidArgument(
                "cover image is empty".to_string(),
            ));
        }
        if bytes.len() > MAX_COVER_SIZE {
            return Err(WordbookError::InvalidArgument(format!(
                "cover image exceeds {} bytes",
                MAX_COVER_SIZE
            )));
        }
        self.store.get_notebook(notebook)?;

        let stamp = Local::now().format(FILE_STAMP_FORMAT);
        let cover_ref = format!("{}_{}.{}", notebook, stamp, ext);
        let covers = self.layout.covers_dir();
        fs::create_dir_all(&covers)?;
        let path = covers.join(&cover_ref);
        fs::write(&path, bytes)?;

        if let Err(e) = self.store.set_cover(notebook, Some(&cover_ref)) {
            if let Err(cleanup) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %cleanup, "could not remove unused cover");
            }
            return Err(e);
        }
        debug!(%notebook, cover = %cover_ref, size = bytes.len(), "cover saved");
        Ok(cover_ref)
    }

    /// Resolve a cover reference to a file inside the covers directory.
    ///
    /// References containing path separators or `..` are rejected so a
    /// stored reference can never point outside the directory.
    pub fn cover_path(&self, cover_ref: &str) -> Result<PathBuf> {
        let plain = !cover_ref.is_empty()
            && !cover_ref.contains(['/', '\\'])
            && cover_ref != "."
            && !cover_ref.contains("..");
        if !plain {
            return Err(WordbookError::InvalidArgument(format!(
                "invalid cover reference '{}'",
                cover_ref
            )));
        }
        let path = self.layout.covers_dir().join(cover_ref);
        if !path.is_file() {
            return Err(WordbookError::NotFound(format!("cover '{}'", cover_ref)));
        }
        Ok(path)
    }

    /// Reopen the store after the database file under it was replaced.
    pub(crate) fn reopen(&mut self) -> Result<()> {
        self.store = WordStore::with_options(self.layout.db_path(), self.config.options)?;
        Ok(())
    }
}

/// Lowercased extension of `file_name` if it is an accepted image type.
fn cover_extension(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if COVER_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(WordbookError::InvalidFileType(format!(
            "'{}' is not an image; expected one of {}",
            file_name,
            COVER_EXTENSIONS.join(", ")
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_layout() {
        let temp = tempdir().expect("temp dir");
        let root = temp.path().join("data");
        let book = Wordbook::open(StoreConfig::new(&root)).expect("open");
        assert!(root.join("wordbook.db").is_file());
        assert!(root.join("covers").is_dir());
        assert_eq!(book.layout().root(), root.as_path());
    }

    #[test]
    fn save_cover_writes_file_and_sets_reference() {
        let temp = tempdir().expect("temp dir");
        let book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
        let nb = book.store().create_notebook("Biology", None).expect("create");

        let cover = book.save_cover(nb, "Photo.PNG", b"\x89PNG").expect("save");
        assert!(cover.starts_with(&format!("{}_", nb)));
        assert!(cover.ends_with(".png"));
        assert_eq!(
            book.store().get_notebook(nb).expect("get").cover.as_deref(),
            Some(cover.as_str())
        );
        let path = book.cover_path(&cover).expect("path");
        assert_eq!(fs::read(path).expect("read"), b"\x89PNG");
    }

    #[test]
    fn save_cover_rejects_non_images() {
        let temp = tempdir().expect("temp dir");
        let book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
        let nb = book.store().create_notebook("Biology", None).expect("create");
        assert!(matches!(
            book.save_cover(nb, "notes.txt", b"hello"),
            Err(WordbookError::InvalidFileType(_))
        ));
        assert!(matches!(
            book.save_cover(nb, "noext", b"hello"),
            Err(WordbookError::InvalidFileType(_))
        ));
    }

    #[test]
    fn save_cover_for_missing_notebook_writes_nothing() {
        let temp = tempdir().expect("temp dir");
        let book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
        assert!(matches!(
            book.save_cover(NotebookId(5), "a.jpg", b"jpeg"),
            Err(WordbookError::NotebookNotFound(_))
        ));
        let files = fs::read_dir(book.layout().covers_dir()).expect("dir").count();
        assert_eq!(files, 0);
    }

    #[test]
    fn cover_path_rejects_traversal() {
        let temp = tempdir().expect("temp dir");
        let book = Wordbook::open(StoreConfig::new(temp.path().join("data"))).expect("open");
        for bad in ["../wordbook.db", "a/b.png", "..", ""] {
            assert!(matches!(
                book.cover_path(bad),
                Err(WordbookError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            book.cover_path("missing.png"),
            Err(WordbookError::NotFound(_))
        ));
    }
}
