//! # wordbook-core
//!
//! The persistent vocabulary store for Wordbook.
//!
//! Words live once in a global catalog. Notebooks are named collections, and
//! memberships link the two with their own add time. The whole data
//! directory (one redb database file plus a covers directory) can be exported
//! as a zip archive and restored from one.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async runtime, no network
//! - Every logical operation runs in one redb write transaction
//! - Word text and (notebook, word) pairs are unique at the storage layer
//! - The data directory is passed in by the caller
//!
//! ## Example
//!
//! ```no_run
//! use wordbook_core::{Page, StoreConfig, Wordbook};
//!
//! # fn main() -> wordbook_core::Result<()> {
//! let book = Wordbook::open(StoreConfig::new("/tmp/wordbook"))?;
//! let biology = book.store().create_notebook("Biology", None)?;
//! book.store()
//!     .add_word_to_notebook(biology, "cell", Some("a basic unit of life"), None)?;
//! let page = book.store().list_words(biology, Page::all())?;
//! assert_eq!(page.total, 1);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod backup;
pub mod catalog;
pub mod config;
pub mod library;
pub mod membership;
pub mod primitives;
pub mod registry;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use backup::{ArchiveExport, ImportReport, NotebookExport};
pub use config::{DataLayout, EmptyExportPolicy, MergePolicy, StoreConfig, StoreOptions};
pub use library::Wordbook;
pub use storage::WordStore;
pub use storage::schema::{PRIMARY_TABLES, SCHEMA_VERSION, missing_tables, validate_restored};
pub use types::{
    EntryId, MoveOutcome, Notebook, NotebookId, NotebookSummary, Page, Result, StoreStats, Word,
    WordEntry, WordId, WordInfo, WordPage, WordbookError,
};
