//! # Store Configuration
//!
//! The data directory is always passed in by the caller; the store never
//! looks it up on its own. Behavioural switches that earlier versions of the
//! application disagreed on are named here instead of being hard-coded.

use crate::primitives::{COVERS_DIR, DB_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What happens to a word's definition and note when it is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Always overwrite definition and note with the latest values.
    #[default]
    Overwrite,
    /// Keep the existing definition and note when the word is already a
    /// member of the target notebook; overwrite otherwise.
    PreserveInNotebook,
}

/// How `export_notebook` treats a notebook without words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyExportPolicy {
    /// Produce a table with only the header row.
    #[default]
    EmptyTable,
    /// Fail with `EmptyNotebook`.
    Reject,
}

/// Tunable store behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub merge_policy: MergePolicy,
    pub empty_export: EmptyExportPolicy,
    /// Append `added in <notebook> at <time>` to the note when a word joins
    /// a notebook.
    pub annotate_provenance: bool,
    /// Copy the live data directory aside before an import replaces it.
    pub keep_safety_backups: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::default(),
            empty_export: EmptyExportPolicy::default(),
            annotate_provenance: false,
            keep_safety_backups: true,
        }
    }
}

/// Full configuration of a [`Wordbook`](crate::Wordbook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the database file and the covers directory.
    pub data_dir: PathBuf,
    #[serde(flatten)]
    pub options: StoreOptions,
}

impl StoreConfig {
    /// Configuration with default options rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            options: StoreOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Paths derived from the data directory.
    #[must_use]
    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

/// Where things live inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILE_NAME)
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.root.join(COVERS_DIR)
    }

    /// Directory that contains the data directory. Staging and backup
    /// directories are created here so renames stay on one filesystem.
    pub fn parent(&self) -> PathBuf {
        self.root
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// A sibling of the data directory: `<root>.<label>-<stamp>`.
    pub fn sibling(&self, label: &str, stamp: &str) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wordbook".to_string());
        self.parent().join(format!("{}.{}-{}", name, label, stamp))
    }
}

// =============================================================================
// TESTS
// =============================================================================
