//! # Wordbook CLI Module
//!
//! This module implements the CLI interface for Wordbook.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store statistics
//! - `notebook` - List, create, rename, delete, duplicate, cover, export
//! - `word` - Add, list, remove, move, copy, info, search
//! - `backup` - Export or import the whole data directory
//! - `lookup` - Look a word up on a dictionary site

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wordbook_core::WordbookError;

pub use commands::*;

/// Configuration file read from the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "wordbook.toml";

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Wordbook - personal vocabulary notebooks
///
/// Keep words with their definitions and notes in named notebooks, look them
/// up online, and back the whole collection up as one zip archive.
#[derive(Parser, Debug)]
#[command(name = "wordbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data directory (database and covers). Defaults to ~/.wordbook
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store statistics
    Status,

    /// Manage notebooks
    #[command(subcommand)]
    Notebook(NotebookCommand),

    /// Manage words in notebooks
    #[command(subcommand)]
    Word(WordCommand),

    /// Back up or restore the data directory
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Look a word up on a dictionary site
    Lookup {
        word: String,

        /// Dictionary platform (youdao, bing)
        #[arg(short, long)]
        platform: Option<String>,
    },
}

/// `wordbook notebook ...`
#[derive(Subcommand, Debug)]
pub enum NotebookCommand {
    /// List notebooks, newest first
    List,

    /// Create a notebook
    Create {
        name: String,

        /// Cover reference to record
        #[arg(long)]
        cover: Option<String>,
    },

    /// Rename a notebook
    Rename { id: u64, name: String },

    /// Delete a notebook (its words stay in the catalog)
    Delete { id: u64 },

    /// Copy a notebook with all of its words
    Duplicate { id: u64 },

    /// Set a notebook's cover from an image file
    Cover { id: u64, image: PathBuf },

    /// Export a notebook's words as CSV
    Export {
        id: u64,

        /// Output file (defaults to the suggested name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `wordbook word ...`
#[derive(Subcommand, Debug)]
pub enum WordCommand {
    /// Add a word to a notebook (updating its definition and note)
    Add {
        notebook: u64,
        word: String,

        #[arg(short, long)]
        definition: Option<String>,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// List a notebook's words, newest first
    List {
        notebook: u64,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short, long)]
        offset: Option<usize>,
    },

    /// Remove a word from a notebook
    Remove { notebook: u64, word: String },

    /// Move words from one notebook to another
    Move {
        from: u64,
        to: u64,
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Copy words into a notebook
    Copy {
        to: u64,
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Show whether a word is known, with its definition and note
    Info { word: String },

    /// Search known words by substring
    Search { keyword: String },
}

/// `wordbook backup ...`
#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Write the whole data directory to a zip archive
    Export {
        /// Output file (defaults to the suggested name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the data directory with a backup archive
    Import { archive: PathBuf },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Resolve configuration: file, then environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, WordbookError> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);
    let file = match &cli.config {
        Some(path) => Some(path.as_path()),
        None if default_file.is_file() => Some(default_file),
        None => None,
    };
    let mut config = AppConfig::load(file)?;
    if let Some(dir) = &cli.data_dir {
        config.store.data_dir = Some(dir.clone());
    }
    Ok(config)
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), WordbookError> {
    let config = resolve_config(&cli)?;
    if cli.verbose {
        tracing::info!(?config, "resolved configuration");
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Notebook(command)) => match command {
            NotebookCommand::List => cmd_notebook_list(&config, json_mode),
            NotebookCommand::Create { name, cover } => {
                cmd_notebook_create(&config, json_mode, &name, cover.as_deref())
            }
            NotebookCommand::Rename { id, name } => {
                cmd_notebook_rename(&config, json_mode, id, &name)
            }
            NotebookCommand::Delete { id } => cmd_notebook_delete(&config, json_mode, id),
            NotebookCommand::Duplicate { id } => cmd_notebook_duplicate(&config, json_mode, id),
            NotebookCommand::Cover { id, image } => {
                cmd_notebook_cover(&config, json_mode, id, &image)
            }
            NotebookCommand::Export { id, output } => {
                cmd_notebook_export(&config, json_mode, id, output.as_deref())
            }
        },
        Some(Commands::Word(command)) => match command {
            WordCommand::Add {
                notebook,
                word,
                definition,
                note,
            } => cmd_word_add(
                &config,
                json_mode,
                notebook,
                &word,
                definition.as_deref(),
                note.as_deref(),
            ),
            WordCommand::List {
                notebook,
                limit,
                offset,
            } => cmd_word_list(&config, json_mode, notebook, limit, offset),
            WordCommand::Remove { notebook, word } => {
                cmd_word_remove(&config, json_mode, notebook, &word)
            }
            WordCommand::Move { from, to, words } => {
                cmd_word_move(&config, json_mode, from, to, &words)
            }
            WordCommand::Copy { to, words } => cmd_word_copy(&config, json_mode, to, &words),
            WordCommand::Info { word } => cmd_word_info(&config, json_mode, &word),
            WordCommand::Search { keyword } => cmd_word_search(&config, json_mode, &keyword),
        },
        Some(Commands::Backup(command)) => match command {
            BackupCommand::Export { output } => {
                cmd_backup_export(&config, json_mode, output.as_deref())
            }
            BackupCommand::Import { archive } => cmd_backup_import(&config, json_mode, &archive),
        },
        Some(Commands::Lookup { word, platform }) => {
            cmd_lookup(&config, json_mode, &word, platform.as_deref()).await
        }
    }
}
