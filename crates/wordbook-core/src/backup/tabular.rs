//! Single-notebook spreadsheet export.
//!
//! CSV with a UTF-8 byte order mark and the columns `word, definition, note,
//! add_time`, one row per membership, newest first.

use super::NotebookExport;
use crate::config::EmptyExportPolicy;
use crate::primitives::{EXPORT_COLUMNS, FILE_STAMP_FORMAT, UTF8_BOM};
use crate::storage::{WordStore, display_time};
use crate::types::{NotebookId, Page, Result, WordbookError};
use chrono::Local;
use tracing::info;

impl WordStore {
    /// Render a notebook's words as CSV.
    ///
    /// A notebook without words yields a header-only table, or
    /// `EmptyNotebook` under [`EmptyExportPolicy::Reject`].
    pub fn export_notebook(&self, id: NotebookId) -> Result<NotebookExport> {
        let notebook = self.get_notebook(id)?;
        let page = self.list_words(id, Page::all())?;
        if page.words.is_empty() && self.options().empty_export == EmptyExportPolicy::Reject {
            return Err(WordbookError::EmptyNotebook(id));
        }

        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
        writer.write_record(EXPORT_COLUMNS)?;
        for entry in &page.words {
            let added = display_time(entry.add_time);
            writer.write_record([
                entry.word.as_str(),
                entry.definition.as_deref().unwrap_or(""),
                entry.note.as_deref().unwrap_or(""),
                added.as_str(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| WordbookError::Io(e.to_string()))?;

        let file_name = format!(
            "{}_{}.csv",
            file_stem(&notebook.name),
            Local::now().format(FILE_STAMP_FORMAT)
        );
        let rows = page.words.len();
        info!(%id, rows, file = %file_name, "notebook exported");
        Ok(NotebookExport {
            file_name,
            bytes,
            rows,
        })
    }
}

/// Notebook name reduced to characters that are safe in a file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "notebook".to_string()
    } else {
        stem.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
