//! Digital storefront keyword search.
//!
//! The storefront only offers keyword search, so identifier queries are
//! routed here as their ISBN text.

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::error::SearchError;
use crate::http;
use crate::types::{AdapterCapabilities, BookRecord};

const LABEL: &str = "storefront API";
const COVER_BASE: &str = "https://img.ridicdn.net/cover";

/// Storefront search API client restricted to one site (catalog section).
pub struct StorefrontAdapter {
    client: reqwest::Client,
    api_url: String,
    web_url: String,
    site: String,
}

impl StorefrontAdapter {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        web_url: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            web_url: web_url.into().trim_end_matches('/').to_string(),
            site: site.into(),
        }
    }

    fn to_record(&self, book: Book) -> Option<BookRecord> {
        let raw_title = if book.web_title_title.trim().is_empty() {
            &book.title
        } else {
            &book.web_title_title
        };
        let title = strip_tags(raw_title).trim().to_string();
        if title.is_empty() {
            return None;
        }

        let mut author = book.author.trim().to_string();
        if !book.author2.trim().is_empty() {
            author = format!("{author}, {}", book.author2.trim());
        }
        if !book.translator.trim().is_empty() {
            author = format!("{author} (tr. {})", book.translator.trim());
        }

        let b_id = book.b_id.trim();
        let (url, cover) = if b_id.is_empty() {
            (None, String::new())
        } else {
            (
                Some(format!("{}/books/{b_id}", self.web_url)),
                format!("{COVER_BASE}/{b_id}/xxlarge"),
            )
        };

        Some(
            BookRecord {
                title: Some(title),
                author: (!author.is_empty()).then_some(author),
                isbn: None,
                availability: Some("available".into()),
                url,
                additional_info: Default::default(),
            }
            .with_info("publisher", book.publisher.trim())
            .with_info("cover", cover)
            .with_info("book_id", b_id),
        )
    }
}

#[async_trait]
impl SourceAdapter for StorefrontAdapter {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::TITLE_ONLY
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let request = self.client.get(format!("{}/search", self.api_url)).query(&[
            ("keyword", term.text()),
            ("where", "book"),
            ("site", self.site.as_str()),
            ("what", "base"),
            ("start", "0"),
        ]);
        let response: SearchResponse = http::fetch_json(request, LABEL).await?;
        tracing::debug!(total = response.total, "storefront search");

        Ok(response
            .books
            .into_iter()
            .filter_map(|book| self.to_record(book))
            .take(max_results)
            .collect())
    }
}

/// Remove highlight markup such as `<strong class="title_point">`.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Deserialize)]
struct Book {
    #[serde(default)]
    b_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    web_title_title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    author2: String,
    #[serde(default)]
    translator: String,
    #[serde(default)]
    publisher: String,
}
