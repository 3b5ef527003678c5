//! Directory-level replacement of the live data directory.
//!
//! All paths here are siblings of the data directory, so every rename stays
//! on one filesystem and is atomic on its own.

use crate::config::DataLayout;
use crate::primitives::COVERS_DIR;
use crate::storage::WordStore;
use crate::types::{Result, WordbookError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A sibling path `<root>.<label>-<stamp>` that does not exist yet.
pub(super) fn free_sibling(layout: &DataLayout, label: &str, stamp: &str) -> PathBuf {
    let base = layout.sibling(label, stamp);
    if !base.exists() {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = layout.sibling(label, &format!("{}-{}", stamp, n));
        if !candidate.exists() {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

/// Copy the live database and covers aside. Failure is logged and reported
/// as `None`; it never stops the import.
pub(super) fn safety_backup(layout: &DataLayout, store: &WordStore, stamp: &str) -> Option<PathBuf> {
    let dest = free_sibling(layout, "backup", stamp);
    match write_safety_backup(layout, store, &dest) {
        Ok(()) => {
            info!(path = %dest.display(), "safety backup written");
            Some(dest)
        }
        Err(e) => {
            warn!(path = %dest.display(), error = %e, "safety backup failed, continuing import");
            if dest.exists() {
                if let Err(e) = fs::remove_dir_all(&dest) {
                    warn!(path = %dest.display(), error = %e, "could not remove partial safety backup");
                }
            }
            None
        }
    }
}

fn write_safety_backup(layout: &DataLayout, store: &WordStore, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest.join(COVERS_DIR))?;
    store.snapshot_to(DataLayout::new(dest).db_path())?;
    copy_files(&layout.covers_dir(), &dest.join(COVERS_DIR))?;
    Ok(())
}

/// Copy the regular files directly inside `from` into `to`. A missing `from`
/// copies nothing.
fn copy_files(from: &Path, to: &Path) -> Result<usize> {
    if !from.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::copy(entry.path(), to.join(entry.file_name()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Put `staged` in place of the live data directory.
///
/// The live directory is first renamed to `<root>.old-<stamp>`, then `staged`
/// is renamed to the live path. If the second rename fails the first one is
/// undone; if that also fails the error is `PartialImport` and names where the
/// previous data now lives. On success the old directory's path is returned
/// for the caller to remove once nothing holds files in it.
pub(super) fn swap_in(layout: &DataLayout, staged: &Path, stamp: &str) -> Result<Option<PathBuf>> {
    let live = layout.root();
    let old = if live.exists() {
        let old = free_sibling(layout, "old", stamp);
        fs::rename(live, &old)?;
        Some(old)
    } else {
        None
    };

    if let Err(e) = fs::rename(staged, live) {
        if let Some(old) = &old {
            if let Err(rollback) = fs::rename(old, live) {
                return Err(WordbookError::PartialImport(format!(
                    "could not install restored data ({}) nor restore the previous data ({}); \
                     previous data is in {}, restored data is in {}",
                    e,
                    rollback,
                    old.display(),
                    staged.display()
                )));
            }
        }
        return Err(e.into());
    }
    Ok(old)
}

// =============================================================================
// TESTS
// =============================================================================
