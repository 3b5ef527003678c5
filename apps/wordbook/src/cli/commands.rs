//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Every
//! command prints plain text, or one JSON document with `--json-mode`.

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::lookup::{Dictionary, HttpDictionary, Platform};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wordbook_core::{
    MoveOutcome, NotebookId, Page, Wordbook, WordbookError,
    primitives::{MAX_ARCHIVE_SIZE, MAX_COVER_SIZE},
};

// =============================================================================
// HELPERS
// =============================================================================

/// Open the store named by the configuration, creating it if needed.
pub fn open_wordbook(config: &AppConfig) -> Result<Wordbook, WordbookError> {
    Wordbook::open(config.store_config()?)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: usize) -> Result<(), WordbookError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| WordbookError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size as u64 {
        return Err(WordbookError::InvalidArgument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, WordbookError> {
    let canonical = path.canonicalize().map_err(|e| {
        WordbookError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(WordbookError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve where an export is written: the given path, or the suggested
/// file name in the current directory.
fn validate_output_path(output: Option<&Path>, suggested: &str) -> Result<PathBuf, WordbookError> {
    let path = output.map_or_else(|| PathBuf::from(suggested), Path::to_path_buf);
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        WordbookError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(WordbookError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| WordbookError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let dictionary: Arc<dyn Dictionary> = Arc::new(HttpDictionary::new(&config.lookup)?);
    let data_dir = wordbook.layout().root().to_path_buf();
    let state =
        AppState::new(wordbook, dictionary).with_default_platform(config.lookup.default_platform);

    println!("Wordbook Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", config.server.host);
    println!("  Port:      {}", config.server.port);
    println!("  Data dir:  {}", data_dir.display());
    println!("  Merge:     {:?}", config.store.options.merge_policy);
    println!("  Lookup:    {}", config.lookup.default_platform);
    println!();
    println!("Endpoints:");
    println!("  GET  /api/notebooks              - List notebooks");
    println!("  POST /api/notebooks/{{id}}/words   - Add a word");
    println!("  GET  /api/words/search           - Search words");
    println!("  GET  /api/translate              - Dictionary lookup");
    println!("  GET  /api/backup/export          - Download a backup");
    println!("  GET  /health                     - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(state, &config.server).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store statistics.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let stats = wordbook.store().stats()?;
    let data_dir = wordbook.layout().root();

    if json_mode {
        print_json(&serde_json::json!({
            "data_dir": data_dir.to_string_lossy(),
            "notebooks": stats.notebooks,
            "words": stats.words,
            "entries": stats.entries,
        }));
        return Ok(());
    }

    println!("Wordbook Status");
    println!("===============");
    println!("Data dir:  {}", data_dir.display());
    println!();
    println!("Notebooks: {}", stats.notebooks);
    println!("Words:     {}", stats.words);
    println!("Entries:   {}", stats.entries);

    Ok(())
}

// =============================================================================
// NOTEBOOK COMMANDS
// =============================================================================

/// List notebooks.
pub fn cmd_notebook_list(config: &AppConfig, json_mode: bool) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let notebooks = wordbook.store().list_notebooks()?;

    if json_mode {
        print_json(&serde_json::json!({ "notebooks": notebooks }));
        return Ok(());
    }

    if notebooks.is_empty() {
        println!("No notebooks.");
        return Ok(());
    }
    println!("{:>6}  {:>6}  {:<20}  NAME", "ID", "WORDS", "CREATED");
    for summary in &notebooks {
        println!(
            "{:>6}  {:>6}  {:<20}  {}",
            summary.notebook.id,
            summary.word_count,
            summary.notebook.created_at.format("%Y-%m-%d %H:%M:%S"),
            summary.notebook.name
        );
    }
    Ok(())
}

/// Create a notebook.
pub fn cmd_notebook_create(
    config: &AppConfig,
    json_mode: bool,
    name: &str,
    cover: Option<&str>,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let id = wordbook.store().create_notebook(name, cover)?;
    let notebook = wordbook.store().get_notebook(id)?;

    if json_mode {
        print_json(&notebook);
    } else {
        println!("Created notebook {} ({})", notebook.id, notebook.name);
    }
    Ok(())
}

/// Rename a notebook.
pub fn cmd_notebook_rename(
    config: &AppConfig,
    json_mode: bool,
    id: u64,
    name: &str,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let notebook = wordbook.store().rename_notebook(NotebookId(id), name)?;

    if json_mode {
        print_json(&notebook);
    } else {
        println!("Renamed notebook {} to {}", notebook.id, notebook.name);
    }
    Ok(())
}

/// Delete a notebook.
pub fn cmd_notebook_delete(config: &AppConfig, json_mode: bool, id: u64) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let removed = wordbook.store().delete_notebook(NotebookId(id))?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "removed_entries": removed }));
    } else {
        println!("Deleted notebook {} ({} memberships removed)", id, removed);
    }
    Ok(())
}

/// Duplicate a notebook.
pub fn cmd_notebook_duplicate(
    config: &AppConfig,
    json_mode: bool,
    id: u64,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let copy = wordbook.store().duplicate_notebook(NotebookId(id))?;
    let notebook = wordbook.store().get_notebook(copy)?;

    if json_mode {
        print_json(&notebook);
    } else {
        println!("Created notebook {} ({})", notebook.id, notebook.name);
    }
    Ok(())
}

/// Set a notebook cover from an image file.
pub fn cmd_notebook_cover(
    config: &AppConfig,
    json_mode: bool,
    id: u64,
    image: &Path,
) -> Result<(), WordbookError> {
    let path = validate_file_path(image)?;
    validate_file_size(&path, MAX_COVER_SIZE)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| WordbookError::InvalidArgument("image path has no file name".to_string()))?;
    let bytes = std::fs::read(&path)?;

    let wordbook = open_wordbook(config)?;
    let cover = wordbook.save_cover(NotebookId(id), &file_name, &bytes)?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "cover": cover }));
    } else {
        println!("Cover of notebook {} set to {}", id, cover);
    }
    Ok(())
}

/// Export a notebook as CSV.
pub fn cmd_notebook_export(
    config: &AppConfig,
    json_mode: bool,
    id: u64,
    output: Option<&Path>,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let export = wordbook.store().export_notebook(NotebookId(id))?;
    let path = validate_output_path(output, &export.file_name)?;
    std::fs::write(&path, &export.bytes)?;

    if json_mode {
        print_json(&serde_json::json!({
            "path": path.to_string_lossy(),
            "rows": export.rows,
        }));
    } else {
        println!("Exported {} words to {}", export.rows, path.display());
    }
    Ok(())
}

// =============================================================================
// WORD COMMANDS
// =============================================================================

/// Add a word to a notebook.
pub fn cmd_word_add(
    config: &AppConfig,
    json_mode: bool,
    notebook: u64,
    word: &str,
    definition: Option<&str>,
    note: Option<&str>,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let entry = wordbook
        .store()
        .add_word_to_notebook(NotebookId(notebook), word, definition, note)?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "word": entry }));
    } else {
        println!("Added '{}' to notebook {}", entry.word, notebook);
    }
    Ok(())
}

/// List a notebook's words.
pub fn cmd_word_list(
    config: &AppConfig,
    json_mode: bool,
    notebook: u64,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let page = wordbook
        .store()
        .list_words(NotebookId(notebook), Page::new(limit, offset))?;

    if json_mode {
        print_json(&page);
        return Ok(());
    }

    println!("{} of {} words", page.words.len(), page.total);
    for entry in &page.words {
        match entry.definition.as_deref() {
            Some(definition) => println!("  {}: {}", entry.word, definition.replace('\n', "; ")),
            None => println!("  {}", entry.word),
        }
    }
    Ok(())
}

/// Remove a word from a notebook.
pub fn cmd_word_remove(
    config: &AppConfig,
    json_mode: bool,
    notebook: u64,
    word: &str,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let removed = wordbook.store().remove_word(NotebookId(notebook), word)?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "removed": removed }));
    } else if removed {
        println!("Removed '{}' from notebook {}", word, notebook);
    } else {
        println!("'{}' was not in notebook {}", word, notebook);
    }
    Ok(())
}

/// Move words between notebooks.
pub fn cmd_word_move(
    config: &AppConfig,
    json_mode: bool,
    from: u64,
    to: u64,
    words: &[String],
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let store = wordbook.store();
    let mut results = Vec::with_capacity(words.len());
    for word in words {
        let outcome = store.move_word(NotebookId(from), NotebookId(to), word)?;
        results.push((word.as_str(), outcome));
    }

    if json_mode {
        let json: Vec<_> = results
            .iter()
            .map(|(word, outcome)| serde_json::json!({ "word": word, "outcome": outcome }))
            .collect();
        print_json(&json);
        return Ok(());
    }

    for (word, outcome) in &results {
        match outcome {
            MoveOutcome::Moved => println!("  {}: moved", word),
            MoveOutcome::Merged => println!("  {}: already in target, merged", word),
            MoveOutcome::NotMember => println!("  {}: not in notebook {}, skipped", word, from),
        }
    }
    Ok(())
}

/// Copy words into a notebook.
pub fn cmd_word_copy(
    config: &AppConfig,
    json_mode: bool,
    to: u64,
    words: &[String],
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let store = wordbook.store();
    let mut results = Vec::with_capacity(words.len());
    for word in words {
        let added = store.copy_word(NotebookId(to), word)?;
        results.push((word.as_str(), added));
    }

    if json_mode {
        let json: Vec<_> = results
            .iter()
            .map(|(word, added)| serde_json::json!({ "word": word, "added": added }))
            .collect();
        print_json(&json);
        return Ok(());
    }

    for (word, added) in &results {
        if *added {
            println!("  {}: copied", word);
        } else {
            println!("  {}: already in notebook {}", word, to);
        }
    }
    Ok(())
}

/// Show a word's catalog entry.
pub fn cmd_word_info(config: &AppConfig, json_mode: bool, word: &str) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let info = wordbook.store().word_info(word)?;

    if json_mode {
        print_json(&info);
        return Ok(());
    }

    if !info.exists {
        println!("'{}' is not in the catalog", word);
        return Ok(());
    }
    println!("{}", word);
    println!("  Definition: {}", info.definition.as_deref().unwrap_or("-"));
    println!("  Note:       {}", info.note.as_deref().unwrap_or("-"));
    Ok(())
}

/// Search the catalog.
pub fn cmd_word_search(
    config: &AppConfig,
    json_mode: bool,
    keyword: &str,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let words = wordbook.store().search_words(keyword)?;

    if json_mode {
        print_json(&serde_json::json!({ "words": words }));
        return Ok(());
    }

    println!("{} matches", words.len());
    for word in &words {
        println!("  {}", word.word);
    }
    Ok(())
}

// =============================================================================
// BACKUP COMMANDS
// =============================================================================

/// Write a backup archive.
pub fn cmd_backup_export(
    config: &AppConfig,
    json_mode: bool,
    output: Option<&Path>,
) -> Result<(), WordbookError> {
    let wordbook = open_wordbook(config)?;
    let export = wordbook.export_archive()?;
    let path = validate_output_path(output, &export.file_name)?;
    std::fs::write(&path, &export.bytes)?;

    if json_mode {
        print_json(&serde_json::json!({
            "path": path.to_string_lossy(),
            "size": export.bytes.len(),
            "stats": export.stats,
            "covers": export.covers,
        }));
    } else {
        println!("Backup written to {}", path.display());
        println!(
            "  {} notebooks, {} words, {} entries, {} covers",
            export.stats.notebooks, export.stats.words, export.stats.entries, export.covers
        );
    }
    Ok(())
}

/// Restore from a backup archive.
pub fn cmd_backup_import(
    config: &AppConfig,
    json_mode: bool,
    archive: &Path,
) -> Result<(), WordbookError> {
    let path = validate_file_path(archive)?;
    validate_file_size(&path, MAX_ARCHIVE_SIZE)?;
    let bytes = std::fs::read(&path)?;

    let mut wordbook = open_wordbook(config)?;
    let report = wordbook.import_archive(&bytes)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Imported {}", path.display());
    println!(
        "  {} notebooks, {} words, {} entries, {} covers",
        report.stats.notebooks, report.stats.words, report.stats.entries, report.covers
    );
    if let Some(backup) = &report.safety_backup {
        println!("  Previous data kept in {}", backup.display());
    }
    for skipped in &report.skipped {
        println!("  Skipped archive entry {}", skipped);
    }
    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Look a word up online.
pub async fn cmd_lookup(
    config: &AppConfig,
    json_mode: bool,
    word: &str,
    platform: Option<&str>,
) -> Result<(), WordbookError> {
    let platform = match platform {
        Some(name) => Platform::parse_or_default(Some(name)),
        None => config.lookup.default_platform,
    };
    let dictionary = HttpDictionary::new(&config.lookup)?;
    let result = dictionary.lookup(word, platform).await?;

    if json_mode {
        print_json(&result);
        return Ok(());
    }

    println!("{} ({})", result.headword, platform);
    println!("  UK: {}", result.uk_pronunciation);
    println!("  US: {}", result.us_pronunciation);
    for line in result.meaning.lines() {
        println!("  {}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_defaults_to_suggested_name() {
        let path = validate_output_path(None, "wordbook_backup_1.zip").expect("path");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("wordbook_backup_1.zip")
        );
    }

    #[test]
    fn output_path_requires_existing_directory() {
        let result = validate_output_path(Some(Path::new("/no/such/dir/out.csv")), "x.csv");
        assert!(matches!(result, Err(WordbookError::Io(_))));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 16]).expect("write");
        assert!(validate_file_size(&path, 8).is_err());
        assert!(validate_file_size(&path, 16).is_ok());
    }
}
