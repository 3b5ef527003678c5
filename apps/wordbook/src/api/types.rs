//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Requests are
//! validated here, before they reach the store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wordbook_core::{
    Notebook, NotebookId, NotebookSummary, Page, StoreStats, Word, WordEntry, WordbookError,
    primitives::{MAX_NOTEBOOK_NAME_LENGTH, MAX_WORD_LENGTH},
};

/// Largest number of words accepted by one move or copy request.
pub const MAX_BATCH_WORDS: usize = 1000;

// =============================================================================
// HEALTH / STATS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Store statistics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StoreStats,
    pub data_dir: PathBuf,
}

// =============================================================================
// NOTEBOOKS
// =============================================================================

/// `POST /api/notebooks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotebookRequest {
    pub name: String,
    #[serde(default)]
    pub cover: Option<String>,
}

impl CreateNotebookRequest {
    pub fn validate(&self) -> Result<(), WordbookError> {
        validate_name(&self.name)
    }
}

/// `PATCH /api/notebooks/{id}`
///
/// `cover: ""` clears the cover.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNotebookRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl UpdateNotebookRequest {
    pub fn validate(&self) -> Result<(), WordbookError> {
        if self.name.is_none() && self.cover.is_none() {
            return Err(WordbookError::InvalidArgument(
                "nothing to update: give a name or a cover".to_string(),
            ));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }

    /// The cover change, if any: `Some(None)` clears it.
    #[must_use]
    pub fn cover_change(&self) -> Option<Option<&str>> {
        self.cover
            .as_deref()
            .map(|c| if c.trim().is_empty() { None } else { Some(c) })
    }
}

fn validate_name(name: &str) -> Result<(), WordbookError> {
    if name.trim().is_empty() {
        return Err(WordbookError::InvalidArgument(
            "notebook name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_NOTEBOOK_NAME_LENGTH {
        return Err(WordbookError::InvalidArgument(format!(
            "notebook name length {} exceeds maximum {} bytes",
            name.len(),
            MAX_NOTEBOOK_NAME_LENGTH
        )));
    }
    Ok(())
}

/// `GET /api/notebooks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookListResponse {
    pub notebooks: Vec<NotebookSummary>,
}

/// `DELETE /api/notebooks/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteNotebookResponse {
    pub success: bool,
    pub removed_entries: u64,
}

/// `PUT /api/notebooks/{id}/cover?filename=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverQuery {
    pub filename: Option<String>,
}

/// Cover upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverResponse {
    pub success: bool,
    pub notebook: Notebook,
}

// =============================================================================
// WORDS IN A NOTEBOOK
// =============================================================================

/// `POST /api/notebooks/{id}/words`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWordRequest {
    pub word: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl AddWordRequest {
    pub fn validate(&self) -> Result<(), WordbookError> {
        validate_word(&self.word)
    }
}

/// Add word response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWordResponse {
    pub success: bool,
    pub word: WordEntry,
}

/// `GET /api/notebooks/{id}/words?limit=&offset=`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListWordsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListWordsQuery> for Page {
    fn from(q: ListWordsQuery) -> Self {
        Page::new(q.limit, q.offset)
    }
}

/// `DELETE /api/notebooks/{id}/words/{word}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveWordResponse {
    pub success: bool,
    /// Whether a membership existed.
    pub removed: bool,
}

/// Body of the move and copy endpoints. The path names the target notebook.
///
/// The web client sends one request per word as
/// `{"sourceNotebookId": 3, "word": "cell"}`; `words` carries a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_notebook_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<String>,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<(), WordbookError> {
        let count = self.word.iter().count() + self.words.len();
        if count == 0 {
            return Err(WordbookError::InvalidArgument(
                "no words given".to_string(),
            ));
        }
        if count > MAX_BATCH_WORDS {
            return Err(WordbookError::InvalidArgument(format!(
                "{count} words exceeds the batch maximum of {MAX_BATCH_WORDS}"
            )));
        }
        self.word
            .iter()
            .chain(&self.words)
            .try_for_each(|w| validate_word(w))
    }

    #[must_use]
    pub fn source(&self) -> NotebookId {
        NotebookId(self.source_notebook_id)
    }

    /// `word` followed by `words`.
    #[must_use]
    pub fn into_words(self) -> Vec<String> {
        self.word.into_iter().chain(self.words).collect()
    }
}

/// `POST /api/notebooks/{id}/words/move`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Re-pointed to the target notebook.
    pub moved: Vec<String>,
    /// Already in the target; the source membership was dropped.
    pub merged: Vec<String>,
    /// Not in the source notebook.
    pub skipped: Vec<String>,
}

/// `POST /api/notebooks/{id}/words/copy`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyResponse {
    pub copied: Vec<String>,
    /// Already in the target.
    pub skipped: Vec<String>,
}

fn validate_word(word: &str) -> Result<(), WordbookError> {
    if word.trim().is_empty() {
        return Err(WordbookError::InvalidArgument(
            "word cannot be empty".to_string(),
        ));
    }
    if word.len() > MAX_WORD_LENGTH {
        return Err(WordbookError::InvalidArgument(format!(
            "word length {} exceeds maximum {} bytes",
            word.len(),
            MAX_WORD_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// CATALOG
// =============================================================================

/// `GET /api/words/search?keyword=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub words: Vec<Word>,
}

// =============================================================================
// TRANSLATE
// =============================================================================

/// `GET /api/translate?word=&platform=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateQuery {
    pub word: Option<String>,
    pub platform: Option<String>,
}

/// Translate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub word: String,
    pub translation: String,
    pub uk_pronoun: String,
    pub us_pronoun: String,
}
