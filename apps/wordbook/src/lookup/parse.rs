//! HTML extraction for the supported dictionary sites.
//!
//! Both parsers return `None` when the page has no headword, which is how
//! the sites signal an unknown word. Missing pronunciations or meanings are
//! empty strings.

use super::LookupResult;
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn meanings<'a>(items: impl Iterator<Item = ElementRef<'a>>) -> String {
    items.map(text_of).collect::<Vec<_>>().join("\n")
}

fn first_text(document: &Html, css: &str) -> String {
    selector(css)
        .and_then(|sel| document.select(&sel).next().map(text_of))
        .unwrap_or_default()
}

/// Parse a `youdao.com/result` page.
///
/// The headword is the first text node of `div.title`. Each `div.per-phone`
/// holds a label followed by the phonetic; the first block is UK, the second
/// US.
pub fn parse_youdao(html: &str) -> Option<LookupResult> {
    let document = Html::parse_document(html);

    let title = document.select(&selector("div.title")?).next()?;
    let headword = title
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())?
        .to_string();

    let meaning = meanings(document.select(&selector("li.word-exp")?));

    let phones: Vec<String> = document
        .select(&selector("div.per-phone")?)
        .map(|block| {
            block
                .children()
                .filter_map(ElementRef::wrap)
                .nth(1)
                .map(text_of)
                .unwrap_or_default()
        })
        .collect();
    let mut phones = phones.into_iter();

    Some(LookupResult {
        headword,
        meaning,
        uk_pronunciation: phones.next().unwrap_or_default(),
        us_pronunciation: phones.next().unwrap_or_default(),
    })
}

/// Parse a `cn.bing.com/dict/search` page.
pub fn parse_bing(html: &str) -> Option<LookupResult> {
    let document = Html::parse_document(html);

    let heading = document.select(&selector("div.hd_div h1")?).next()?;
    let headword = text_of(heading);
    if headword.is_empty() {
        return None;
    }

    let meaning = document
        .select(&selector("div.qdef ul")?)
        .next()
        .and_then(|list| selector("li").map(|li| meanings(list.select(&li))))
        .unwrap_or_default();

    Some(LookupResult {
        headword,
        meaning,
        uk_pronunciation: first_text(&document, "div.hd_pr"),
        us_pronunciation: first_text(&document, "div.hd_prUS"),
    })
}
