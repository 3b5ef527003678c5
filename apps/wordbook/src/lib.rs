//! # Wordbook Application Library
//!
//! The I/O-facing half of Wordbook: the HTTP API, the CLI, configuration
//! loading and the online dictionary lookup. The binary in `main.rs` only
//! initialises logging and dispatches to [`cli::execute`].
//!
//! All storage logic lives in `wordbook-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod lookup;
