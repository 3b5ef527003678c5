//! # Dictionary Lookup
//!
//! Fetches a word's headword, meaning and pronunciations from a public
//! dictionary page. The store never calls this; the HTTP layer exposes it
//! through `/api/translate` and the CLI through `wordbook lookup`.
//!
//! Page parsing is synchronous and separate from fetching, so it can be
//! tested against saved HTML.

mod http;
mod parse;

pub use http::HttpDictionary;
pub use parse::{parse_bing, parse_youdao};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wordbook_core::Result;

/// Dictionary site to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Youdao,
    Bing,
}

impl Platform {
    /// Parse a platform name; anything unrecognised falls back to the default.
    #[must_use]
    pub fn parse_or_default(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            Some("bing") => Self::Bing,
            Some("youdao") => Self::Youdao,
            _ => Self::default(),
        }
    }

    /// Search page URL for `word`.
    #[must_use]
    pub fn search_url(self, word: &str) -> String {
        match self {
            Self::Youdao => format!(
                "https://www.youdao.com/result?word={}&lang=en",
                urlencoding::encode(word)
            ),
            Self::Bing => format!(
                "https://cn.bing.com/dict/search?q={}",
                urlencoding::encode(word)
            ),
        }
    }

    /// Extract a result from a fetched page.
    pub fn parse(self, html: &str) -> Option<LookupResult> {
        match self {
            Self::Youdao => parse_youdao(html),
            Self::Bing => parse_bing(html),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Youdao => write!(f, "youdao"),
            Self::Bing => write!(f, "bing"),
        }
    }
}

/// What a dictionary page says about a word.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupResult {
    pub headword: String,
    /// Meanings, one per line.
    pub meaning: String,
    pub uk_pronunciation: String,
    pub us_pronunciation: String,
}

/// A source of dictionary lookups.
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// Look `word` up on `platform`.
    ///
    /// # Errors
    ///
    /// `Upstream` when the site cannot be reached or answers with a non-200
    /// status; `WordNotFound` when the page has no headword.
    async fn lookup(&self, word: &str, platform: Platform) -> Result<LookupResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_falls_back_to_youdao() {
        assert_eq!(Platform::parse_or_default(Some("BING")), Platform::Bing);
        assert_eq!(Platform::parse_or_default(Some("google")), Platform::Youdao);
        assert_eq!(Platform::parse_or_default(None), Platform::Youdao);
    }

    #[test]
    fn search_urls() {
        assert_eq!(
            Platform::Youdao.search_url("cell"),
            "https://www.youdao.com/result?word=cell&lang=en"
        );
        assert_eq!(
            Platform::Bing.search_url("cell"),
            "https://cn.bing.com/dict/search?q=cell"
        );
        assert_eq!(
            Platform::Bing.search_url("ice cream"),
            "https://cn.bing.com/dict/search?q=ice%20cream"
        );
    }
}
