//! Dictionary backed by live HTTP requests.

use super::{Dictionary, LookupResult, Platform};
use crate::config::LookupConfig;
use async_trait::async_trait;
use std::time::Duration;
use wordbook_core::{Result, WordbookError};

/// Fetches dictionary pages with `reqwest` and parses them with `scraper`.
#[derive(Debug, Clone)]
pub struct HttpDictionary {
    http: reqwest::Client,
}

impl HttpDictionary {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WordbookError::Upstream(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WordbookError::Upstream(format!("{url}: {e}")))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(WordbookError::Upstream(format!(
                "{url} answered {}",
                status.as_u16()
            )));
        }
        resp.text()
            .await
            .map_err(|e| WordbookError::Upstream(format!("{url}: {e}")))
    }
}

#[async_trait]
impl Dictionary for HttpDictionary {
    async fn lookup(&self, word: &str, platform: Platform) -> Result<LookupResult> {
        let word = word.trim();
        if word.is_empty() {
            return Err(WordbookError::InvalidArgument(
                "word cannot be empty".to_string(),
            ));
        }
        let url = platform.search_url(word);
        tracing::debug!(%platform, word, "dictionary lookup");
        let html = self.fetch(&url).await?;
        platform
            .parse(&html)
            .ok_or_else(|| WordbookError::WordNotFound(word.to_string()))
    }
}
