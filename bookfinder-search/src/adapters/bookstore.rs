//! Online bookstore catalog (TTB open API).
//!
//! `ItemSearch` serves title queries and the Step-1 candidate list;
//! `ItemLookUp` serves ISBN lookups. Both are requested with `output=js`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::error::SearchError;
use crate::http;
use crate::query::main_title;
use crate::resolution::CandidateCatalog;
use crate::types::{AdapterCapabilities, BookRecord, Candidate};

const LABEL: &str = "bookstore API";
const API_VERSION: &str = "20131101";
/// Largest page the catalog serves per request.
const MAX_PAGE: usize = 50;

/// Bookstore catalog client.
pub struct BookstoreAdapter {
    client: reqwest::Client,
    ttb_key: String,
    base_url: String,
}

impl BookstoreAdapter {
    pub fn new(
        client: reqwest::Client,
        ttb_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            ttb_key: ttb_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn search_title(&self, title: &str, limit: usize) -> Result<Vec<Item>, SearchError> {
        let limit = limit.clamp(1, MAX_PAGE).to_string();
        let request = self
            .client
            .get(format!("{}/ItemSearch.aspx", self.base_url))
            .query(&[
                ("ttbkey", self.ttb_key.as_str()),
                ("Query", title),
                ("QueryType", "Title"),
                ("MaxResults", limit.as_str()),
                ("start", "1"),
                ("SearchTarget", "Book"),
                ("output", "js"),
                ("Version", API_VERSION),
            ]);
        self.fetch(request).await
    }

    async fn lookup_isbn(&self, isbn: &str) -> Result<Vec<Item>, SearchError> {
        let id_type = if isbn.len() == 13 { "ISBN13" } else { "ISBN" };
        let request = self
            .client
            .get(format!("{}/ItemLookUp.aspx", self.base_url))
            .query(&[
                ("ttbkey", self.ttb_key.as_str()),
                ("itemIdType", id_type),
                ("ItemId", isbn),
                ("output", "js"),
                ("Version", API_VERSION),
            ]);
        self.fetch(request).await
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<Vec<Item>, SearchError> {
        let body = http::fetch_text(request, LABEL).await?;
        parse_response(&body)
    }
}

#[async_trait]
impl SourceAdapter for BookstoreAdapter {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let items = match term {
            QueryTerm::Identifier(isbn) => self.lookup_isbn(isbn).await?,
            QueryTerm::Title(title) => self.search_title(title, max_results).await?,
        };
        Ok(items.into_iter().take(max_results).map(Item::into_record).collect())
    }
}

#[async_trait]
impl CandidateCatalog for BookstoreAdapter {
    async fn candidates(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        tracing::trace!(keyword, limit, "candidate lookup");
        let items = self.search_title(keyword, limit).await?;
        Ok(items
            .into_iter()
            .take(limit)
            .filter_map(Item::into_candidate)
            .collect())
    }
}

/// Parse an `output=js` body, surfacing API-level error objects.
///
/// The catalog escapes single quotes as `\'`, which is not valid JSON.
pub(crate) fn parse_response(body: &str) -> Result<Vec<Item>, SearchError> {
    let cleaned = body.trim().trim_end_matches(';').replace("\\'", "'");
    let response: Response = serde_json::from_str(&cleaned)
        .map_err(|e| SearchError::Parse(format!("{LABEL} returned invalid JSON: {e}")))?;

    if let Some(code) = response.error_code {
        let message = response.error_message.unwrap_or_default();
        return Err(SearchError::Http(format!(
            "{LABEL} error {code}: {message}"
        )));
    }
    Ok(response.item)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    item: Vec<Item>,
    #[serde(default)]
    error_code: Option<serde_json::Value>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    pub_date: String,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    isbn13: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    category_name: String,
    #[serde(default)]
    price_sales: Option<i64>,
    #[serde(default)]
    price_standard: Option<i64>,
    #[serde(default)]
    stock_status: String,
}

impl Item {
    fn best_isbn(&self) -> Option<String> {
        [&self.isbn13, &self.isbn]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn into_record(self) -> BookRecord {
        let availability = match self.stock_status.trim() {
            "" => "in stock".to_string(),
            status => status.to_string(),
        };
        let mut record = BookRecord {
            isbn: self.best_isbn(),
            title: non_empty(&self.title),
            author: non_empty(&self.author),
            availability: Some(availability),
            url: non_empty(&self.link),
            additional_info: Default::default(),
        }
        .with_info("publisher", self.publisher)
        .with_info("pub_date", self.pub_date)
        .with_info("category", self.category_name)
        .with_info("cover", self.cover);
        if let Some(price) = self.price_sales {
            record = record.with_info("price_sales", price);
        }
        if let Some(price) = self.price_standard {
            record = record.with_info("price_standard", price);
        }
        record
    }

    fn into_candidate(self) -> Option<Candidate> {
        let isbn = self.best_isbn()?;
        let main = main_title(&self.title).to_string();
        Some(Candidate {
            isbn,
            main_title: (!main.is_empty()).then_some(main),
            title: self.title,
            author: non_empty(&self.author),
            publisher: non_empty(&self.publisher),
            pub_date: non_empty(&self.pub_date),
            cover: non_empty(&self.cover),
            link: non_empty(&self.link),
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
