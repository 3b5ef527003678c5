//! # Application Configuration
//!
//! Loaded from `wordbook.toml` (optional), then overridden by environment
//! variables, then by CLI flags.
//!
//! ```toml
//! [store]
//! data_dir = "/home/me/.wordbook"
//! merge_policy = "overwrite"          # or "preserve_in_notebook"
//! empty_export = "empty_table"        # or "reject"
//! annotate_provenance = false
//! keep_safety_backups = true
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! cors_origins = ["http://localhost:5173"]
//! max_upload_bytes = 536870912
//!
//! [lookup]
//! default_platform = "youdao"
//! timeout_secs = 10
//! ```
//!
//! ## Environment Variables
//!
//! - `WORDBOOK_DATA_DIR`: data directory
//! - `WORDBOOK_CORS_ORIGINS`: comma-separated origins, or `*` for all

use crate::lookup::Platform;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use wordbook_core::primitives::MAX_ARCHIVE_SIZE;
use wordbook_core::{StoreConfig, StoreOptions, WordbookError};

/// Name of the data directory under the home directory.
pub const DEFAULT_DATA_DIR_NAME: &str = ".wordbook";

/// Full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSection,
    pub server: ServerConfig,
    pub lookup: LookupConfig,
}

/// `[store]`: the data directory plus store options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// `None` means `~/.wordbook`.
    pub data_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub options: StoreOptions,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means localhost only; `["*"]` allows all.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body (backup uploads, cover images).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            max_upload_bytes: MAX_ARCHIVE_SIZE,
        }
    }
}

/// `[lookup]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub default_platform: Platform,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            default_platform: Platform::default(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ".to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `path` if given, then apply environment
    /// overrides. A missing file is an error only when it was named
    /// explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, WordbookError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, WordbookError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WordbookError::Io(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, WordbookError> {
        toml::from_str(text)
            .map_err(|e| WordbookError::InvalidArgument(format!("invalid config: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("WORDBOOK_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.store.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(origins) = std::env::var("WORDBOOK_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// The store configuration, with `data_dir` resolved.
    pub fn store_config(&self) -> Result<StoreConfig, WordbookError> {
        let data_dir = match &self.store.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        Ok(StoreConfig::new(data_dir).with_options(self.store.options))
    }
}

/// `~/.wordbook`
pub fn default_data_dir() -> Result<PathBuf, WordbookError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
        .ok_or_else(|| {
            WordbookError::InvalidArgument(
                "no home directory; set WORDBOOK_DATA_DIR or --data-dir".to_string(),
            )
        })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wordbook_core::{EmptyExportPolicy, MergePolicy};

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.lookup.default_platform, Platform::Youdao);
        assert_eq!(config.store.options, StoreOptions::default());
        assert!(config.store.data_dir.is_none());
    }

    #[test]
    fn store_section_flattens_options() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            data_dir = "/srv/wordbook"
            merge_policy = "preserve_in_notebook"
            empty_export = "reject"

            [server]
            port = 9000
            "#,
        )
        .expect("parse");
        assert_eq!(config.store.data_dir, Some(PathBuf::from("/srv/wordbook")));
        assert_eq!(
            config.store.options.merge_policy,
            MergePolicy::PreserveInNotebook
        );
        assert_eq!(config.store.options.empty_export, EmptyExportPolicy::Reject);
        assert!(config.store.options.keep_safety_backups);
        assert_eq!(config.server.port, 9000);

        let store = config.store_config().expect("store config");
        assert_eq!(store.data_dir, PathBuf::from("/srv/wordbook"));
    }

    #[test]
    fn invalid_toml_is_invalid_argument() {
        let result = AppConfig::from_toml("[server]\nport = \"high\"");
        assert!(matches!(result, Err(WordbookError::InvalidArgument(_))));
    }
}
