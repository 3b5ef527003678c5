//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use wordbook::api::{
    AddWordRequest, CreateNotebookRequest, ErrorBody, ErrorDetail, HealthResponse,
    ListWordsQuery, MAX_BATCH_WORDS, MoveResponse, TransferRequest, TranslateResponse,
    UpdateNotebookRequest,
};
use wordbook_core::{NotebookId, Page, WordbookError};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// ERROR BODY TESTS
// =============================================================================

#[test]
fn test_error_body_shape() {
    let body = ErrorBody {
        detail: ErrorDetail {
            code: "NOTEBOOK_NOT_FOUND".to_string(),
            message: "Notebook not found: 3".to_string(),
        },
    };
    let json: serde_json::Value = serde_json::to_value(&body).unwrap();
    assert_eq!(json["detail"]["code"], "NOTEBOOK_NOT_FOUND");
    assert_eq!(json["detail"]["message"], "Notebook not found: 3");
}

// =============================================================================
// NOTEBOOK REQUEST TESTS
// =============================================================================

#[test]
fn test_create_notebook_request_optional_cover() {
    let request: CreateNotebookRequest = serde_json::from_str(r#"{"name":"Biology"}"#).unwrap();
    assert_eq!(request.name, "Biology");
    assert!(request.cover.is_none());
    assert!(request.validate().is_ok());
}

#[test]
fn test_create_notebook_request_rejects_long_name() {
    let request = CreateNotebookRequest {
        name: "n".repeat(10_000),
        cover: None,
    };
    assert!(matches!(
        request.validate(),
        Err(WordbookError::InvalidArgument(_))
    ));
}

#[test]
fn test_update_notebook_cover_change() {
    let clear: UpdateNotebookRequest = serde_json::from_str(r#"{"cover":""}"#).unwrap();
    assert_eq!(clear.cover_change(), Some(None));
    assert!(clear.validate().is_ok());

    let set: UpdateNotebookRequest = serde_json::from_str(r#"{"cover":"1_a.png"}"#).unwrap();
    assert_eq!(set.cover_change(), Some(Some("1_a.png")));

    let rename: UpdateNotebookRequest = serde_json::from_str(r#"{"name":"Bio"}"#).unwrap();
    assert_eq!(rename.cover_change(), None);
}

#[test]
fn test_update_notebook_blank_name() {
    let request = UpdateNotebookRequest {
        name: Some(" ".to_string()),
        cover: None,
    };
    assert!(request.validate().is_err());
}

// =============================================================================
// WORD REQUEST TESTS
// =============================================================================

#[test]
fn test_add_word_request_defaults() {
    let request: AddWordRequest = serde_json::from_str(r#"{"word":"cell"}"#).unwrap();
    assert!(request.definition.is_none());
    assert!(request.note.is_none());
    assert!(request.validate().is_ok());
}

#[test]
fn test_list_words_query_to_page() {
    let query = ListWordsQuery {
        limit: Some(10),
        offset: None,
    };
    assert_eq!(Page::from(query), Page::new(Some(10), None));
    assert_eq!(Page::from(ListWordsQuery::default()), Page::all());
}

#[test]
fn test_transfer_request_validation() {
    let single: TransferRequest =
        serde_json::from_str(r#"{"sourceNotebookId":7,"word":"cell"}"#).unwrap();
    assert!(single.validate().is_ok());
    assert_eq!(single.source(), NotebookId(7));
    assert_eq!(single.into_words(), vec!["cell"]);

    let batch: TransferRequest =
        serde_json::from_str(r#"{"sourceNotebookId":7,"word":"cell","words":["gene"]}"#)
            .unwrap();
    assert!(batch.validate().is_ok());
    assert_eq!(batch.into_words(), vec!["cell", "gene"]);

    let none = TransferRequest {
        source_notebook_id: 7,
        ..TransferRequest::default()
    };
    assert!(none.validate().is_err());

    let blank = TransferRequest {
        source_notebook_id: 7,
        word: None,
        words: vec!["cell".to_string(), "".to_string()],
    };
    assert!(blank.validate().is_err());

    let oversized = TransferRequest {
        source_notebook_id: 7,
        word: Some("cell".to_string()),
        words: vec!["w".to_string(); MAX_BATCH_WORDS],
    };
    assert!(oversized.validate().is_err());
}

#[test]
fn test_transfer_request_requires_source() {
    assert!(serde_json::from_str::<TransferRequest>(r#"{"word":"cell"}"#).is_err());
}

#[test]
fn test_move_response_serialization() {
    let response = MoveResponse {
        moved: vec!["cell".to_string()],
        merged: vec![],
        skipped: vec!["ghost".to_string()],
    };
    let json = serde_json::to_string(&response).unwrap();
    assert_eq!(json, r#"{"moved":["cell"],"merged":[],"skipped":["ghost"]}"#);
}

// =============================================================================
// TRANSLATE RESPONSE TESTS
// =============================================================================

#[test]
fn test_translate_response_field_names() {
    let response = TranslateResponse {
        word: "cell".to_string(),
        translation: "n. 细胞".to_string(),
        uk_pronoun: "/sel/".to_string(),
        us_pronoun: "/sɛl/".to_string(),
    };
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["word"], "cell");
    assert_eq!(json["translation"], "n. 细胞");
    assert_eq!(json["uk_pronoun"], "/sel/");
    assert_eq!(json["us_pronoun"], "/sɛl/");
}
