//! Institutional e-book library search over its public HTML results page.
//!
//! No login is needed. The catalog has no ISBN lookup, so identifier
//! queries are searched as text and only the best hit is kept.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::error::SearchError;
use crate::http;
use crate::types::{AdapterCapabilities, BookRecord};

const LABEL: &str = "e-book library";
const SEARCH_PATH: &str = "/search/searchList.ink";
const NO_RESULTS: &str = "검색 결과가 없습니다";
const DESCRIPTION_CHARS: usize = 200;

/// Keyword search against the library's `searchList.ink` form endpoint.
pub struct EbookLibraryAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl EbookLibraryAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for EbookLibraryAdapter {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let limit = if term.is_identifier() { 1 } else { max_results };
        let form = [
            ("schTxt", term.text()),
            ("orderByKey", "RANK"),
            ("pageIndex", "1"),
        ];
        let request = self
            .client
            .post(format!("{}{SEARCH_PATH}", self.base_url))
            .header("Referer", self.base_url.as_str())
            .form(&form);
        let html = http::fetch_text(request, LABEL).await?;
        parse_results(&html, &self.base_url, limit)
    }
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Parse the `ul.book_resultList` listing.
pub(crate) fn parse_results(
    html: &str,
    base_url: &str,
    max_results: usize,
) -> Result<Vec<BookRecord>, SearchError> {
    let document = Html::parse_document(html);

    let empty_sel = selector("p.noResult")?;
    let item_sel = selector("ul.book_resultList > li")?;
    let title_sel = selector("li.tit a")?;
    let writer_sel = selector("li.writer")?;
    let text_sel = selector("li.txt")?;
    let onclick_sel = selector("a[onclick]")?;
    let cover_sel = selector("img")?;
    let borrow_sel = selector(r#"div.btn_area input[name="brwBtn"]"#)?;

    if document
        .select(&empty_sel)
        .any(|p| inner_text(p).contains(NO_RESULTS))
    {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for item in document.select(&item_sel) {
        let Some(title_link) = item.select(&title_sel).next() else {
            continue;
        };
        let title = inner_text(title_link);
        if title.is_empty() {
            continue;
        }

        let (author, publisher, pub_date) = item
            .select(&writer_sel)
            .next()
            .map(split_writer)
            .unwrap_or_default();
        let description: String = item
            .select(&text_sel)
            .next()
            .map(inner_text)
            .unwrap_or_default()
            .chars()
            .take(DESCRIPTION_CHARS)
            .collect();
        let isbn = item
            .select(&onclick_sel)
            .filter_map(|a| a.value().attr("onclick"))
            .find_map(isbn_from_onclick);
        let cover = item
            .select(&cover_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(absolute_cover)
            .unwrap_or_default();
        let url = title_link
            .value()
            .attr("href")
            .and_then(|href| absolute_link(base_url, href));
        let availability = if item.select(&borrow_sel).next().is_some() {
            "available"
        } else {
            "on loan"
        };

        results.push(
            BookRecord {
                title: Some(title),
                author: (!author.is_empty()).then_some(author),
                isbn,
                availability: Some(availability.into()),
                url,
                additional_info: Default::default(),
            }
            .with_info("publisher", publisher)
            .with_info("pub_date", pub_date)
            .with_info("description", description)
            .with_info("cover", cover),
        );

        if results.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = results.len(), "e-book library results parsed");
    Ok(results)
}

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `<li class="writer">author<span>publisher</span>date</li>`
fn split_writer(writer: ElementRef<'_>) -> (String, String, String) {
    let mut author = String::new();
    let mut publisher = None;
    let mut date = String::new();

    for child in writer.children() {
        let target = if publisher.is_some() {
            &mut date
        } else {
            &mut author
        };
        if let Some(el) = ElementRef::wrap(child) {
            if publisher.is_none() && el.value().name() == "span" {
                publisher = Some(inner_text(el));
            } else {
                target.extend(el.text());
            }
        } else if let Some(text) = child.value().as_text() {
            target.push_str(text);
        }
    }

    (
        author.trim().to_string(),
        publisher.unwrap_or_default(),
        date.trim().to_string(),
    )
}

/// The identifier is the third argument of `searchList.fnContentClick(...)`.
fn isbn_from_onclick(onclick: &str) -> Option<String> {
    let (_, args) = onclick.split_once("fnContentClick(")?;
    let value = args
        .split(',')
        .nth(2)?
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    (!value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| value.to_string())
}

fn absolute_cover(src: &str) -> String {
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => src.to_string(),
    }
}

fn absolute_link(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        None
    } else if href.starts_with("http") {
        Some(href.to_string())
    } else {
        Some(format!("{base_url}{href}"))
    }
}
