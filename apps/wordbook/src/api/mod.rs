//! # Wordbook HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/stats` - Store row counts
//! - `GET|POST /api/notebooks` - List / create notebooks
//! - `GET|PATCH|DELETE /api/notebooks/{id}` - One notebook
//! - `POST /api/notebooks/{id}/duplicate` - Copy a notebook
//! - `PUT /api/notebooks/{id}/cover?filename=` - Upload a cover image
//! - `GET /api/notebooks/{id}/export` - Notebook as CSV
//! - `GET|POST /api/notebooks/{id}/words` - List / add words
//! - `DELETE /api/notebooks/{id}/words/{word}` - Remove a word
//! - `POST /api/notebooks/{id}/words/move` - Move words here from `sourceNotebookId`
//! - `POST /api/notebooks/{id}/words/copy` - Copy words here from `sourceNotebookId`
//! - `GET /api/words/search?keyword=` - Search the catalog
//! - `GET /api/words/{word}` - Word info
//! - `GET /api/translate?word=&platform=` - Dictionary lookup
//! - `GET /api/backup/export` - Whole store as zip
//! - `POST /api/backup/import` - Restore from zip
//!
//! ## CORS
//!
//! `[server] cors_origins` (or `WORDBOOK_CORS_ORIGINS`): a list of origins,
//! or `*` for all. Empty means the local development origins only.

mod error;
mod extract;
mod handlers;
mod types;

pub use error::{ApiError, ApiResult, ErrorBody, ErrorDetail, status_for};
pub use types::{
    AddWordRequest, AddWordResponse, CopyResponse, CoverQuery, CoverResponse,
    CreateNotebookRequest, DeleteNotebookResponse, HealthResponse, ListWordsQuery,
    MAX_BATCH_WORDS, MoveResponse, NotebookListResponse, RemoveWordResponse, SearchQuery,
    SearchResponse, StatsResponse, TransferRequest, TranslateQuery, TranslateResponse,
    UpdateNotebookRequest,
};

use crate::config::ServerConfig;
use crate::lookup::{Dictionary, Platform};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wordbook_core::{Wordbook, WordbookError};

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The store. Imports take the write lock; everything else reads.
    pub wordbook: Arc<RwLock<Wordbook>>,
    pub dictionary: Arc<dyn Dictionary>,
    /// Platform used when a translate request names none.
    pub default_platform: Platform,
}

impl AppState {
    #[must_use]
    pub fn new(wordbook: Wordbook, dictionary: Arc<dyn Dictionary>) -> Self {
        Self {
            wordbook: Arc::new(RwLock::new(wordbook)),
            dictionary,
            default_platform: Platform::default(),
        }
    }

    #[must_use]
    pub fn with_default_platform(mut self, platform: Platform) -> Self {
        self.default_platform = platform;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: allowing ALL origins");
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        tracing::info!("CORS: no origins configured, allowing local development origins");
        return build_localhost_cors();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: allowing origin {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS: no valid origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }
    with_defaults(CorsLayer::new().allow_origin(allowed))
}

/// The Vite dev server and the API's own port on localhost.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:8000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    with_defaults(CorsLayer::new().allow_origin(origins))
}

fn with_defaults(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods(METHODS)
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(&config.cors_origins);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/stats", get(handlers::stats_handler))
        .route(
            "/api/notebooks",
            get(handlers::list_notebooks_handler).post(handlers::create_notebook_handler),
        )
        .route(
            "/api/notebooks/{id}",
            get(handlers::get_notebook_handler)
                .patch(handlers::update_notebook_handler)
                .delete(handlers::delete_notebook_handler),
        )
        .route(
            "/api/notebooks/{id}/duplicate",
            post(handlers::duplicate_notebook_handler),
        )
        .route(
            "/api/notebooks/{id}/cover",
            put(handlers::upload_cover_handler),
        )
        .route(
            "/api/notebooks/{id}/export",
            get(handlers::export_notebook_handler),
        )
        .route(
            "/api/notebooks/{id}/words",
            get(handlers::list_words_handler).post(handlers::add_word_handler),
        )
        .route(
            "/api/notebooks/{id}/words/move",
            post(handlers::move_words_handler),
        )
        .route(
            "/api/notebooks/{id}/words/copy",
            post(handlers::copy_words_handler),
        )
        .route(
            "/api/notebooks/{id}/words/{word}",
            delete(handlers::remove_word_handler),
        )
        .route("/api/words/search", get(handlers::search_words_handler))
        .route("/api/words/{word}", get(handlers::word_info_handler))
        .route("/api/translate", get(handlers::translate_handler))
        .route("/api/backup/export", get(handlers::export_backup_handler))
        .route("/api/backup/import", post(handlers::import_backup_handler))
        .layer(axum::extract::DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve until the process is stopped.
pub async fn run_server(state: AppState, config: &ServerConfig) -> Result<(), WordbookError> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WordbookError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Wordbook HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| WordbookError::Io(format!("Server error: {}", e)))
}
