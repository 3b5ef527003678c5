//! # Backup, Export and Import
//!
//! - [`archive`]: the whole data directory as a zip (`wordbook.db` at the
//!   root, cover images under `covers/`), and its validated restore.
//! - [`tabular`]: one notebook as a CSV spreadsheet.
//!
//! Restoring never writes into the live data directory. The archive is
//! extracted and checked in a staging directory next to it, and the two are
//! exchanged with directory renames at the end.

pub mod archive;
mod swap;
pub mod tabular;

use crate::types::StoreStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A finished backup archive.
#[derive(Debug, Clone)]
pub struct ArchiveExport {
    /// Suggested download name, `wordbook_backup_<timestamp>.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Row counts captured in the archived database.
    pub stats: StoreStats,
    /// Number of cover images included.
    pub covers: usize,
}

/// What an import replaced the live data with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub stats: StoreStats,
    pub covers: usize,
    /// Archive entries that were neither the database nor a cover.
    pub skipped: Vec<String>,
    /// Copy of the previous data directory, if one was taken.
    pub safety_backup: Option<PathBuf>,
}

/// A notebook rendered as CSV.
#[derive(Debug, Clone)]
pub struct NotebookExport {
    /// Suggested download name, `<notebook>_<timestamp>.csv`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Data rows, not counting the header.
    pub rows: usize,
}
