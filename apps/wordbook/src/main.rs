//! # Wordbook - Personal Vocabulary Notebooks
//!
//! The main binary for Wordbook.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) for the web frontend
//! - CLI interface for notebook, word and backup operations
//! - Online dictionary lookup
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    apps/wordbook (THE BINARY)                │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │ Dictionary lookup│  │
//! │  │  (clap)     │    │   (axum)    │    │ (reqwest)        │  │
//! │  └──────┬──────┘    └──────┬──────┘    └──────────────────┘  │
//! │         │                  │                                 │
//! │         └────────┬─────────┘                                 │
//! │                  ▼                                           │
//! │          ┌───────────────┐                                   │
//! │          │ wordbook-core │                                   │
//! │          │ (THE STORE)   │                                   │
//! │          └───────────────┘                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! wordbook server --port 8000
//!
//! # CLI operations
//! wordbook notebook create Biology
//! wordbook word add 1 cell -d "a basic unit of life"
//! wordbook backup export -o wordbook.zip
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordbook::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // WORDBOOK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("WORDBOOK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wordbook=info,wordbook_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(code = e.code(), "Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Wordbook startup banner.
fn print_banner() {
    println!(
        r#"
  Wordbook v{}

  Words once, notebooks many.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
