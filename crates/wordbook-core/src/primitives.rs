//! # Store Primitives
//!
//! Fixed names, limits and formats shared by the store and the backup engine.
//! These are compiled in; nothing here is configurable at runtime.

/// File name of the database inside the data directory and at the root of
/// every backup archive.
pub const DB_FILE_NAME: &str = "wordbook.db";

/// Directory (and archive entry prefix) holding notebook cover images.
pub const COVERS_DIR: &str = "covers";

/// Suffix appended to the name of a duplicated notebook.
pub const COPY_SUFFIX: &str = " (copy)";

/// Cover image extensions accepted by the cover store (lowercase).
pub const COVER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a word, in bytes.
pub const MAX_WORD_LENGTH: usize = 256;

/// Maximum length of a notebook name, in bytes.
pub const MAX_NOTEBOOK_NAME_LENGTH: usize = 256;

/// Maximum length of a definition or note, in bytes.
pub const MAX_TEXT_LENGTH: usize = 64 * 1024;

/// Maximum accepted size of a backup archive (512 MB).
///
/// Checked before the archive is parsed.
pub const MAX_ARCHIVE_SIZE: usize = 512 * 1024 * 1024;

/// Maximum total size of the entries extracted from a backup archive
/// (512 MB), whatever their compressed size.
pub const MAX_EXTRACTED_SIZE: u64 = 512 * 1024 * 1024;

/// Maximum accepted size of a single cover image (16 MB).
pub const MAX_COVER_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// FORMATS
// =============================================================================

/// Timestamp format embedded in generated file and directory names.
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format used for human-readable columns and provenance notes.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column headers of the notebook spreadsheet export, in order.
pub const EXPORT_COLUMNS: [&str; 4] = ["word", "definition", "note", "add_time"];

/// UTF-8 byte order mark written at the start of CSV exports so spreadsheet
/// applications detect the encoding.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";
