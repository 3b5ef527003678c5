//! # API Error Mapping
//!
//! Every failure leaves the server as `{"detail": {"code", "message"}}` with
//! the status that matches the store's error variant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use wordbook_core::WordbookError;

/// The `detail` object of an error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

/// A store error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub WordbookError);

impl From<WordbookError> for ApiError {
    fn from(e: WordbookError) -> Self {
        Self(e)
    }
}

/// HTTP status for a store error.
#[must_use]
pub fn status_for(error: &WordbookError) -> StatusCode {
    match error {
        WordbookError::InvalidArgument(_)
        | WordbookError::InvalidFileType(_)
        | WordbookError::InvalidBackup(_)
        | WordbookError::InvalidDatabase(_)
        | WordbookError::EmptyNotebook(_) => StatusCode::BAD_REQUEST,
        WordbookError::WordNotFound(_)
        | WordbookError::NotebookNotFound(_)
        | WordbookError::NotFound(_) => StatusCode::NOT_FOUND,
        WordbookError::Conflict(_) => StatusCode::CONFLICT,
        WordbookError::Upstream(_) => StatusCode::BAD_GATEWAY,
        WordbookError::Storage(_)
        | WordbookError::Serialization(_)
        | WordbookError::Io(_)
        | WordbookError::PartialImport(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if self.0.is_client_error() {
            tracing::debug!(code = self.0.code(), "{}", self.0);
        } else {
            tracing::error!(code = self.0.code(), "{}", self.0);
        }
        let body = ErrorBody {
            detail: ErrorDetail {
                code: self.0.code().to_string(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;
