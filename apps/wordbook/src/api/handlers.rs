//! # API Endpoint Handlers
//!
//! Thin mappings from HTTP onto the store. Store calls take the read side of
//! the lock (redb serialises writers itself); only an import, which replaces
//! the database underneath the store, takes the write side.

use super::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    types::{
        AddWordRequest, AddWordResponse, CopyResponse, CoverQuery, CoverResponse,
        CreateNotebookRequest, DeleteNotebookResponse, HealthResponse, ListWordsQuery,
        MoveResponse, NotebookListResponse, RemoveWordResponse, SearchQuery, SearchResponse,
        StatsResponse, TransferRequest, TranslateQuery, TranslateResponse, UpdateNotebookRequest,
    },
};
use crate::lookup::Platform;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use wordbook_core::{
    ImportReport, MoveOutcome, Notebook, NotebookId, WordInfo, WordPage, WordbookError,
};

// =============================================================================
// HEALTH / STATS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Row counts of the store.
pub async fn stats_handler(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let book = state.wordbook.read().await;
    Ok(Json(StatsResponse {
        stats: book.store().stats()?,
        data_dir: book.layout().root().to_path_buf(),
    }))
}

// =============================================================================
// NOTEBOOKS
// =============================================================================

/// List notebooks, newest first, with their word counts.
pub async fn list_notebooks_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<NotebookListResponse>> {
    let book = state.wordbook.read().await;
    let notebooks = book.store().list_notebooks()?;
    Ok(Json(NotebookListResponse { notebooks }))
}

/// Create a notebook.
pub async fn create_notebook_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateNotebookRequest>,
) -> ApiResult<Json<Notebook>> {
    request.validate()?;
    let book = state.wordbook.read().await;
    let store = book.store();
    let id = store.create_notebook(&request.name, request.cover.as_deref())?;
    Ok(Json(store.get_notebook(id)?))
}

/// Get one notebook.
pub async fn get_notebook_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Notebook>> {
    let book = state.wordbook.read().await;
    Ok(Json(book.store().get_notebook(NotebookId(id))?))
}

/// Rename a notebook and/or change its cover reference.
pub async fn update_notebook_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateNotebookRequest>,
) -> ApiResult<Json<Notebook>> {
    request.validate()?;
    let id = NotebookId(id);
    let book = state.wordbook.read().await;
    let store = book.store();
    if let Some(name) = &request.name {
        store.rename_notebook(id, name)?;
    }
    if let Some(cover) = request.cover_change() {
        store.set_cover(id, cover)?;
    }
    Ok(Json(store.get_notebook(id)?))
}

/// Delete a notebook and its memberships. Words stay in the catalog.
pub async fn delete_notebook_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DeleteNotebookResponse>> {
    let book = state.wordbook.read().await;
    let removed_entries = book.store().delete_notebook(NotebookId(id))?;
    Ok(Json(DeleteNotebookResponse {
        success: true,
        removed_entries,
    }))
}

/// Copy a notebook and its memberships under a new name.
pub async fn duplicate_notebook_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Notebook>> {
    let book = state.wordbook.read().await;
    let store = book.store();
    let copy = store.duplicate_notebook(NotebookId(id))?;
    Ok(Json(store.get_notebook(copy)?))
}

/// Store a cover image (raw request body) and attach it to the notebook.
pub async fn upload_cover_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<CoverQuery>,
    body: Bytes,
) -> ApiResult<Json<CoverResponse>> {
    let file_name = query
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| WordbookError::InvalidArgument("filename is required".to_string()))?;
    let id = NotebookId(id);
    let book = state.wordbook.read().await;
    book.save_cover(id, &file_name, &body)?;
    Ok(Json(CoverResponse {
        success: true,
        notebook: book.store().get_notebook(id)?,
    }))
}

/// Download a notebook as CSV.
pub async fn export_notebook_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Response> {
    let book = state.wordbook.read().await;
    let export = book.store().export_notebook(NotebookId(id))?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        &export.file_name,
        export.bytes,
    ))
}

// =============================================================================
// WORDS IN A NOTEBOOK
// =============================================================================

/// One page of a notebook's words, newest first.
pub async fn list_words_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<ListWordsQuery>,
) -> ApiResult<Json<WordPage>> {
    let book = state.wordbook.read().await;
    Ok(Json(book.store().list_words(NotebookId(id), query.into())?))
}

/// Add (or update) a word and make it a member of the notebook.
pub async fn add_word_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<AddWordRequest>,
) -> ApiResult<Json<AddWordResponse>> {
    request.validate()?;
    let book = state.wordbook.read().await;
    let entry = book.store().add_word_to_notebook(
        NotebookId(id),
        &request.word,
        request.definition.as_deref(),
        request.note.as_deref(),
    )?;
    Ok(Json(AddWordResponse {
        success: true,
        word: entry,
    }))
}

/// Remove a word from the notebook. The word stays in the catalog.
pub async fn remove_word_handler(
    State(state): State<AppState>,
    Path((id, word)): Path<(u64, String)>,
) -> ApiResult<Json<RemoveWordResponse>> {
    let book = state.wordbook.read().await;
    let removed = book.store().remove_word(NotebookId(id), &word)?;
    Ok(Json(RemoveWordResponse {
        success: true,
        removed,
    }))
}

/// Move words from the body's source notebook into the path's notebook.
///
/// Each word is moved in its own transaction. Words unknown to the catalog
/// or absent from the source are reported as skipped.
pub async fn move_words_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TransferRequest>,
) -> ApiResult<Json<MoveResponse>> {
    request.validate()?;
    let source = request.source();
    let target = NotebookId(id);
    let book = state.wordbook.read().await;
    let store = book.store();
    store.get_notebook(source)?;
    store.get_notebook(target)?;

    let mut response = MoveResponse::default();
    for word in request.into_words() {
        match store.move_word(source, target, &word) {
            Ok(MoveOutcome::Moved) => response.moved.push(word),
            Ok(MoveOutcome::Merged) => response.merged.push(word),
            Ok(MoveOutcome::NotMember) | Err(WordbookError::WordNotFound(_)) => {
                response.skipped.push(word);
            }
            Err(e) => return Err(ApiError(e)),
        }
    }
    tracing::info!(
        %source,
        %target,
        moved = response.moved.len(),
        merged = response.merged.len(),
        skipped = response.skipped.len(),
        "words moved"
    );
    Ok(Json(response))
}

/// Copy words from the body's source notebook into the path's notebook.
pub async fn copy_words_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TransferRequest>,
) -> ApiResult<Json<CopyResponse>> {
    request.validate()?;
    let target = NotebookId(id);
    let book = state.wordbook.read().await;
    let store = book.store();
    store.get_notebook(request.source())?;
    store.get_notebook(target)?;

    let mut response = CopyResponse::default();
    for word in request.into_words() {
        match store.copy_word(target, &word) {
            Ok(true) => response.copied.push(word),
            Ok(false) | Err(WordbookError::WordNotFound(_)) => response.skipped.push(word),
            Err(e) => return Err(ApiError(e)),
        }
    }
    Ok(Json(response))
}

// =============================================================================
// CATALOG
// =============================================================================

/// Case-insensitive substring search over every known word.
pub async fn search_words_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let keyword = query.keyword.unwrap_or_default();
    let book = state.wordbook.read().await;
    let words = book.store().search_words(&keyword)?;
    Ok(Json(SearchResponse { words }))
}

/// Whether a word is known, with its definition and note.
pub async fn word_info_handler(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> ApiResult<Json<WordInfo>> {
    let book = state.wordbook.read().await;
    Ok(Json(book.store().word_info(&word)?))
}

// =============================================================================
// TRANSLATE
// =============================================================================

/// Look a word up on a dictionary site.
pub async fn translate_handler(
    State(state): State<AppState>,
    Query(query): Query<TranslateQuery>,
) -> ApiResult<Json<TranslateResponse>> {
    let word = query
        .word
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| WordbookError::InvalidArgument("word cannot be empty".to_string()))?;
    let platform = match query.platform.as_deref() {
        Some(name) => Platform::parse_or_default(Some(name)),
        None => state.default_platform,
    };
    let result = state.dictionary.lookup(&word, platform).await?;
    Ok(Json(TranslateResponse {
        word: result.headword,
        translation: result.meaning,
        uk_pronoun: result.uk_pronunciation,
        us_pronoun: result.us_pronunciation,
    }))
}

// =============================================================================
// BACKUP
// =============================================================================

/// Download the whole data directory as a zip archive.
pub async fn export_backup_handler(State(state): State<AppState>) -> ApiResult<Response> {
    let book = state.wordbook.read().await;
    let export = book.export_archive()?;
    Ok(attachment("application/zip", &export.file_name, export.bytes))
}

/// Replace the data directory with an uploaded archive (raw body).
pub async fn import_backup_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ImportReport>> {
    let mut book = state.wordbook.write().await;
    Ok(Json(book.import_archive(&body)?))
}

// =============================================================================
// DOWNLOADS
// =============================================================================

/// A file download with an ASCII `filename` fallback and a UTF-8
/// `filename*` for non-ASCII notebook names.
fn attachment(content_type: &'static str, file_name: &str, bytes: Vec<u8>) -> Response {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    );
    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
