//! Shared HTTP client construction for source adapters.
//!
//! REST adapters use a plain client; subscription sessions get their own
//! client with a cookie store so the login cookie travels with every
//! request made through that session.

use crate::config::SearchConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Korean-first language preference; most sources serve Korean catalogs.
pub const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// Build a [`reqwest::Client`] for REST sources.
///
/// The client has:
/// - Timeout from config (the coordinator's deadline is usually shorter)
/// - Random User-Agent from the rotation list (or custom if configured)
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    builder(config)
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Build a cookie-holding client for one authenticated session.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_session_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    builder(config)
        .cookie_store(true)
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build session client: {e}")))
}

fn builder(config: &SearchConfig) -> reqwest::ClientBuilder {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .timeout(config.global_timeout())
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Send a request and return the body text, mapping transport and status
/// failures to [`SearchError::Http`] tagged with the source label.
pub(crate) async fn fetch_text(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<String, SearchError> {
    let response = request
        .header("Accept-Language", ACCEPT_LANGUAGE)
        .send()
        .await
        .map_err(|e| transport_error(label, e))?;
    let response = check_status(response, label)?;

    response
        .text()
        .await
        .map_err(|e| read_error(label, e))
}

/// Like [`fetch_text`], but also returns the final URL after redirects.
///
/// Session-backed sources detect a bounce to their login page this way.
pub(crate) async fn fetch_page(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<(url::Url, String), SearchError> {
    let response = request
        .header("Accept-Language", ACCEPT_LANGUAGE)
        .send()
        .await
        .map_err(|e| transport_error(label, e))?;
    let response = check_status(response, label)?;

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| read_error(label, e))?;
    Ok((final_url, body))
}

/// Request URLs carry API keys in their query strings, so errors are
/// formatted without the URL.
fn transport_error(label: &str, e: reqwest::Error) -> SearchError {
    SearchError::Http(format!("{label} request failed: {}", e.without_url()))
}

fn read_error(label: &str, e: reqwest::Error) -> SearchError {
    SearchError::Http(format!("{label} response read failed: {}", e.without_url()))
}

fn check_status(
    response: reqwest::Response,
    label: &str,
) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(SearchError::Http(format!("{label} returned status {status}")));
    }
    Ok(response)
}

/// Like [`fetch_text`], but parses the body as JSON.
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<T, SearchError> {
    let body = fetch_text(request, label).await?;
    serde_json::from_str(&body)
        .map_err(|e| SearchError::Parse(format!("{label} returned invalid JSON: {e}")))
}
