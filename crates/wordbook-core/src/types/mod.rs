//! # Core Type Definitions
//!
//! This module contains the public types of the Wordbook store:
//! - Identifiers (`WordId`, `NotebookId`, `EntryId`)
//! - Catalog, registry and membership views (`Word`, `Notebook`, `WordEntry`)
//! - Paging and outcome types for association operations
//! - Error types (`WordbookError`)
//!
//! The on-disk record layouts live in `storage`; everything here is what
//! callers see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Surrogate identifier of a row in the Word Catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(pub u64);

/// Surrogate identifier of a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotebookId(pub u64);

/// Surrogate identifier of a membership (word in notebook) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl std::fmt::Display for NotebookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// WORD CATALOG
// =============================================================================

/// A word in the global, deduplicated catalog.
///
/// At most one `Word` exists per distinct word text (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub word: String,
    pub definition: Option<String>,
    pub note: Option<String>,
}

/// Existence probe for a word, independent of notebook membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WordInfo {
    pub exists: bool,
    pub definition: Option<String>,
    pub note: Option<String>,
}

impl From<Option<Word>> for WordInfo {
    fn from(word: Option<Word>) -> Self {
        match word {
            Some(w) => Self {
                exists: true,
                definition: w.definition,
                note: w.note,
            },
            None => Self::default(),
        }
    }
}

// =============================================================================
// NOTEBOOK REGISTRY
// =============================================================================

/// A named collection of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub name: String,
    /// Reference to a file in the covers directory, if any.
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A notebook together with its membership count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookSummary {
    #[serde(flatten)]
    pub notebook: Notebook,
    pub word_count: u64,
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// One word as seen through a notebook: catalog data plus the add time of
/// the membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub definition: Option<String>,
    pub note: Option<String>,
    pub add_time: DateTime<Utc>,
}

/// A page of notebook words plus the total membership count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WordPage {
    pub words: Vec<WordEntry>,
    pub total: u64,
}

/// Paging window for `list_words`.
///
/// `None` means unconstrained: no limit returns every row, no offset starts
/// at the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    /// Every row, unbounded.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            limit: None,
            offset: None,
        }
    }

    /// An explicit window.
    #[must_use]
    pub const fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self { limit, offset }
    }

    /// Apply the window to an already ordered sequence.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        let skip = self.offset.unwrap_or(0);
        let take = self.limit.unwrap_or(usize::MAX);
        rows.into_iter().skip(skip).take(take).collect()
    }
}

/// Result of re-pointing a membership from one notebook to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The membership now belongs to the target notebook.
    Moved,
    /// The word was already in the target; the source membership was dropped.
    Merged,
    /// The word was not a member of the source notebook.
    NotMember,
}

/// Row counts of the three primary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreStats {
    pub notebooks: u64,
    pub words: u64,
    pub entries: u64,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Wordbook system.
///
/// Every variant carries a stable machine-readable code (see [`code`]) and a
/// human-readable message (its `Display`).
///
/// [`code`]: WordbookError::code
#[derive(Debug, Error)]
pub enum WordbookError {
    /// A required field is missing, empty, or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The word is not in the catalog.
    #[error("Word not found: {0}")]
    WordNotFound(String),

    /// The notebook id does not exist.
    #[error("Notebook not found: {0}")]
    NotebookNotFound(NotebookId),

    /// Some other resource (backup entry, cover file) is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The uploaded bytes are not a zip archive.
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    /// The archive is a zip but not a Wordbook backup.
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    /// The database inside the archive is unusable.
    #[error("Invalid database: {0}")]
    InvalidDatabase(String),

    /// Export was requested for a notebook without words.
    #[error("Notebook {0} has no words to export")]
    EmptyNotebook(NotebookId),

    /// The dictionary lookup collaborator failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The embedded database reported an error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// The import swap failed and could not be rolled back.
    #[error("Import left the data directory partially replaced: {0}")]
    PartialImport(String),
}

impl WordbookError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_PARAMS",
            Self::WordNotFound(_) => "WORD_NOT_FOUND",
            Self::NotebookNotFound(_) => "NOTEBOOK_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::InvalidBackup(_) => "INVALID_BACKUP",
            Self::InvalidDatabase(_) => "INVALID_DATABASE",
            Self::EmptyNotebook(_) => "EMPTY_NOTEBOOK",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Storage(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::PartialImport(_) => "PARTIAL_IMPORT",
        }
    }

    /// Whether the error was caused by the caller's input rather than by the
    /// store or its environment.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::WordNotFound(_)
                | Self::NotebookNotFound(_)
                | Self::NotFound(_)
                | Self::Conflict(_)
                | Self::InvalidFileType(_)
                | Self::InvalidBackup(_)
                | Self::InvalidDatabase(_)
                | Self::EmptyNotebook(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WordbookError>;

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for WordbookError {
                fn from(e: $ty) -> Self {
                    Self::Storage(e.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<postcard::Error> for WordbookError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<csv::Error> for WordbookError {
    fn from(e: csv::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for WordbookError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
