//! Subscription e-book library behind an institutional login.
//!
//! Sessions are expensive, so they live in a [`SessionPool`] and are reused
//! across searches. When the service bounces a request back to its login
//! page the session has expired: the adapter logs in again once and retries.
//! A second rejection is reported as an authentication failure.
//!
//! The transport is behind [`SessionBackend`] so the session policy can be
//! exercised without the real service.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::session::SessionPool;
use crate::types::{AdapterCapabilities, BookRecord};

const LABEL: &str = "subscription service";
const LOGIN_PATH: &str = "/login.do";
const SEARCH_PATH: &str = "/front/home/searchList.do";
const DETAIL_PATH: &str = "/front/home/contentDetail.do";

/// Login and search primitives of a session-based source.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    type Session: Send + Sync + 'static;

    /// Establish a new authenticated session.
    ///
    /// # Errors
    ///
    /// [`SearchError::Authentication`] when credentials are rejected, or a
    /// transport error.
    async fn login(&self) -> Result<Self::Session, SearchError>;

    /// Search within an established session.
    ///
    /// # Errors
    ///
    /// [`SearchError::SessionExpired`] when the service no longer accepts
    /// the session; any other error is returned as-is.
    async fn search(
        &self,
        session: &Self::Session,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError>;
}

/// Subscription source adapter over any [`SessionBackend`].
pub struct SubscriptionAdapter<B: SessionBackend> {
    backend: B,
    pool: SessionPool<B::Session>,
}

impl<B: SessionBackend> SubscriptionAdapter<B> {
    pub fn new(backend: B, max_sessions: usize) -> Self {
        Self {
            backend,
            pool: SessionPool::new(max_sessions),
        }
    }

    pub fn pool(&self) -> &SessionPool<B::Session> {
        &self.pool
    }
}

#[async_trait]
impl<B: SessionBackend> SourceAdapter for SubscriptionAdapter<B> {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        // The service has no ISBN lookup: the ISBN is searched as text and
        // only the best hit is kept.
        let limit = if term.is_identifier() { 1 } else { max_results };
        let keyword = term.text();

        let mut lease = self.pool.acquire(|| self.backend.login()).await?;
        match self.backend.search(&lease, keyword, limit).await {
            Err(SearchError::SessionExpired(reason)) => {
                tracing::info!(%reason, "session expired, re-authenticating");
                let fresh = match self.backend.login().await {
                    Ok(session) => session,
                    Err(e) => {
                        lease.discard();
                        return Err(into_auth(e));
                    }
                };
                lease.replace(fresh);

                match self.backend.search(&lease, keyword, limit).await {
                    Err(SearchError::SessionExpired(reason)) => {
                        lease.discard();
                        Err(SearchError::Authentication(format!(
                            "session rejected after re-authentication: {reason}"
                        )))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }
}

fn into_auth(err: SearchError) -> SearchError {
    match err {
        SearchError::Authentication(_) => err,
        other => SearchError::Authentication(format!("re-authentication failed: {other}")),
    }
}

/// Institutional login credentials.
#[derive(Clone)]
pub struct PortalCredentials {
    pub org_name: String,
    pub org_code: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("org_name", &self.org_name)
            .field("org_code", &self.org_code)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookie-session backend for the subscription web portal.
///
/// Each session is its own cookie-holding client, so sessions never share
/// login state.
pub struct PortalBackend {
    config: SearchConfig,
    base_url: String,
    credentials: PortalCredentials,
}

impl PortalBackend {
    pub fn new(
        config: SearchConfig,
        base_url: impl Into<String>,
        credentials: PortalCredentials,
    ) -> Self {
        Self {
            config,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

#[async_trait]
impl SessionBackend for PortalBackend {
    type Session = reqwest::Client;

    async fn login(&self) -> Result<reqwest::Client, SearchError> {
        let client = http::build_session_client(&self.config)?;
        let login_url = format!("{}{LOGIN_PATH}", self.base_url);

        // Landing on the form first picks up the pre-login cookies.
        http::fetch_page(client.get(&login_url), LABEL).await?;

        let creds = &self.credentials;
        let form = [
            ("um_uis_code", creds.org_code.as_str()),
            ("orgName", creds.org_name.as_str()),
            ("um_userid", creds.username.as_str()),
            ("um_pwd", creds.password.as_str()),
        ];
        let (landed, _) = http::fetch_page(client.post(&login_url).form(&form), LABEL).await?;
        if is_login_page(&landed) {
            return Err(SearchError::Authentication(
                "login rejected, still on the login page".into(),
            ));
        }

        tracing::debug!("subscription login succeeded");
        Ok(client)
    }

    async fn search(
        &self,
        session: &reqwest::Client,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let request = session
            .get(format!("{}{SEARCH_PATH}", self.base_url))
            .query(&[("searchName", keyword)]);
        let (landed, html) = http::fetch_page(request, LABEL).await?;
        if is_login_page(&landed) {
            return Err(SearchError::SessionExpired(
                "redirected to the login page".into(),
            ));
        }
        parse_results(&html, &self.base_url, max_results)
    }
}

fn is_login_page(url: &url::Url) -> bool {
    url.path().ends_with(LOGIN_PATH)
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Parse the search results page.
pub(crate) fn parse_results(
    html: &str,
    base_url: &str,
    max_results: usize,
) -> Result<Vec<BookRecord>, SearchError> {
    let document = Html::parse_document(html);

    let banner_sel = selector(".resultTitle")?;
    let item_sel = selector(".cardList_listType.searcBook ul li")?;
    let title_sel = selector(".infoBookTitle")?;
    let author_sel = selector(".infoAuthorName")?;
    let publisher_sel = selector(".infoPublisher")?;
    let cover_sel = selector(".coverArea img.cover")?;
    let book_sel = selector(".book")?;
    let badge_sel = selector(".book_badge")?;

    if let Some(banner) = document.select(&banner_sel).next() {
        let text = inner_text(banner);
        if text.contains("(0)건") || text.contains("결과가 없습니다") {
            return Ok(Vec::new());
        }
    }

    let mut results = Vec::new();
    for item in document.select(&item_sel) {
        let title = first_text(item, &title_sel);
        if title.is_empty() {
            continue;
        }
        let author = first_text(item, &author_sel);
        let publisher = first_text(item, &publisher_sel);
        let cover = first_attr(item, &cover_sel, "src");
        let link = first_attr(item, &book_sel, "id")
            .filter(|id| !id.is_empty())
            .map(|id| format!("{base_url}{DETAIL_PATH}?ucm_code={id}"));
        let file_type = first_attr(item, &badge_sel, "src")
            .map(|src| src.to_lowercase())
            .and_then(|src| {
                if src.contains("pdf") {
                    Some("PDF")
                } else if src.contains("epub") {
                    Some("EPUB")
                } else {
                    None
                }
            });

        let mut record = BookRecord {
            title: Some(title),
            author: (!author.is_empty()).then_some(author),
            isbn: None,
            availability: Some("available".into()),
            url: link,
            additional_info: Default::default(),
        }
        .with_info("publisher", publisher)
        .with_info("cover", cover.unwrap_or_default());
        if let Some(kind) = file_type {
            record = record.with_info("file_type", kind);
        }
        results.push(record);

        if results.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = results.len(), "subscription results parsed");
    Ok(results)
}

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(inner_text).unwrap_or_default()
}

fn first_attr(scope: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}
