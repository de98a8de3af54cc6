//! Public library holdings via the library information API.
//!
//! For each configured branch code, `bookExist` reports whether that branch
//! holds the ISBN and whether a copy is on the shelf. Branches are queried
//! concurrently and merged; branch names come from `libSrch` and are
//! memoized for the lifetime of the adapter.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::error::SearchError;
use crate::http;
use crate::types::{AdapterCapabilities, BookRecord};

const LABEL: &str = "library API";

/// Holdings lookup across a fixed list of library branches.
pub struct PublicLibraryAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    libraries: Vec<String>,
    names: Mutex<HashMap<String, String>>,
}

impl PublicLibraryAdapter {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        libraries: &[String],
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            libraries: libraries
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            names: Mutex::new(HashMap::new()),
        }
    }

    async fn branch(&self, code: &str, isbn: &str) -> Result<Option<BookRecord>, SearchError> {
        let request = self.client.get(format!("{}/bookExist", self.base_url)).query(&[
            ("authKey", self.api_key.as_str()),
            ("libCode", code),
            ("isbn13", isbn),
            ("format", "json"),
        ]);
        let body: Envelope<ExistResponse> = http::fetch_json(request, LABEL).await?;
        let response = body.response;
        if let Some(error) = response.error {
            return Err(SearchError::Http(format!("{LABEL} rejected request: {error}")));
        }
        let Some(result) = response.result else {
            return Err(SearchError::Parse(format!("{LABEL} response has no result")));
        };
        if result.has_book != "Y" {
            return Ok(None);
        }

        let on_shelf = result.loan_available == "Y";
        let name = self.branch_name(code).await;
        Ok(Some(
            BookRecord {
                title: Some(name.clone()),
                author: None,
                isbn: Some(isbn.to_string()),
                availability: Some(if on_shelf { "available" } else { "on loan" }.into()),
                url: None,
                additional_info: Default::default(),
            }
            .with_info("library_code", code)
            .with_info("library_name", name)
            .with_info("loan_available", on_shelf),
        ))
    }

    async fn branch_name(&self, code: &str) -> String {
        if let Some(name) = self.cached_name(code) {
            return name;
        }
        match self.fetch_branch_name(code).await {
            Ok(Some(name)) => {
                if let Ok(mut names) = self.names.lock() {
                    names.insert(code.to_string(), name.clone());
                }
                name
            }
            Ok(None) => fallback_name(code),
            Err(e) => {
                tracing::debug!(code, error = %e, "branch name lookup failed");
                fallback_name(code)
            }
        }
    }

    fn cached_name(&self, code: &str) -> Option<String> {
        self.names.lock().ok()?.get(code).cloned()
    }

    async fn fetch_branch_name(&self, code: &str) -> Result<Option<String>, SearchError> {
        let request = self.client.get(format!("{}/libSrch", self.base_url)).query(&[
            ("authKey", self.api_key.as_str()),
            ("libCode", code),
            ("format", "json"),
        ]);
        let body: Envelope<LibSearchResponse> = http::fetch_json(request, LABEL).await?;
        Ok(body
            .response
            .libs
            .into_iter()
            .map(|entry| entry.lib)
            .find(|lib| lib.lib_code.is_empty() || lib.lib_code == code)
            .map(|lib| lib.lib_name)
            .filter(|name| !name.trim().is_empty()))
    }
}

#[async_trait]
impl SourceAdapter for PublicLibraryAdapter {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::IDENTIFIER_ONLY
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let QueryTerm::Identifier(isbn) = term else {
            return Err(SearchError::Unsupported(
                "library holdings are looked up by ISBN only".into(),
            ));
        };
        tracing::trace!(isbn, branches = self.libraries.len(), "library lookup");

        let outcomes = join_all(self.libraries.iter().map(|code| self.branch(code, isbn))).await;

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for (code, outcome) in self.libraries.iter().zip(outcomes) {
            match outcome {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(code, error = %e, "library branch failed");
                    errors.push(format!("{code}: {e}"));
                }
            }
        }

        if !errors.is_empty() && errors.len() == self.libraries.len() {
            return Err(SearchError::Http(format!(
                "all library branches failed ({})",
                errors.join("; ")
            )));
        }

        records.truncate(max_results);
        Ok(records)
    }
}

fn fallback_name(code: &str) -> String {
    format!("library {code}")
}

#[derive(Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Deserialize)]
struct ExistResponse {
    #[serde(default)]
    result: Option<ExistResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExistResult {
    #[serde(default)]
    has_book: String,
    #[serde(default)]
    loan_available: String,
}

#[derive(Deserialize)]
struct LibSearchResponse {
    #[serde(default)]
    libs: Vec<LibEntry>,
}

#[derive(Deserialize)]
struct LibEntry {
    lib: Lib,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lib {
    #[serde(default)]
    lib_code: String,
    #[serde(default)]
    lib_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ISBN: &str = "9788966261161";

    fn exist(has_book: &str, loan: &str) -> serde_json::Value {
        serde_json::json!({
            "response": {
                "request": { "isbn13": ISBN },
                "result": { "hasBook": has_book, "loanAvailable": loan }
            }
        })
    }

    async fn mount_exist(server: &MockServer, code: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/bookExist"))
            .and(query_param("libCode", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_name(server: &MockServer, code: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path("/libSrch"))
            .and(query_param("libCode", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": { "libs": [ { "lib": { "libCode": code, "libName": name } } ] }
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn adapter(server: &MockServer, codes: &[&str]) -> PublicLibraryAdapter {
        let client = http::build_client(&SearchConfig::default()).expect("client");
        let codes: Vec<String> = codes.iter().map(|c| (*c).to_string()).collect();
        PublicLibraryAdapter::new(client, "key", server.uri(), &codes)
    }

    #[tokio::test]
    async fn merges_holdings_across_branches() {
        let server = MockServer::start().await;
        mount_exist(&server, "111", exist("Y", "Y")).await;
        mount_exist(&server, "222", exist("Y", "N")).await;
        mount_exist(&server, "333", exist("N", "N")).await;
        mount_name(&server, "111", "Central Library").await;
        mount_name(&server, "222", "East Branch").await;

        let records = adapter(&server, &["111", "222", "333"])
            .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
            .await
            .expect("lookup");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Central Library"));
        assert_eq!(records[0].availability.as_deref(), Some("available"));
        assert_eq!(records[1].availability.as_deref(), Some("on loan"));
        assert_eq!(records[1].additional_info["library_code"], "222");
    }

    #[tokio::test]
    async fn branch_names_are_memoized() {
        let server = MockServer::start().await;
        mount_exist(&server, "111", exist("Y", "Y")).await;
        mount_name(&server, "111", "Central Library").await;

        let adapter = adapter(&server, &["111"]);
        for _ in 0..3 {
            let records = adapter
                .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
                .await
                .expect("lookup");
            assert_eq!(records[0].title.as_deref(), Some("Central Library"));
        }
        // `expect(1)` on the libSrch mock is verified when the server drops.
    }

    #[tokio::test]
    async fn missing_branch_name_falls_back_to_code() {
        let server = MockServer::start().await;
        mount_exist(&server, "777", exist("Y", "Y")).await;

        let records = adapter(&server, &["777"])
            .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
            .await
            .expect("lookup");
        assert_eq!(records[0].title.as_deref(), Some("library 777"));
    }

    #[tokio::test]
    async fn failing_branch_is_skipped() {
        let server = MockServer::start().await;
        mount_exist(&server, "111", exist("Y", "Y")).await;
        mount_name(&server, "111", "Central Library").await;
        Mock::given(method("GET"))
            .and(path("/bookExist"))
            .and(query_param("libCode", "999"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let records = adapter(&server, &["111", "999"])
            .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
            .await
            .expect("lookup");
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn all_branches_failing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookExist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": { "error": "인증키 오류" }
            })))
            .mount(&server)
            .await;

        let err = adapter(&server, &["111", "222"])
            .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all library branches failed"));
    }

    #[tokio::test]
    async fn title_terms_are_unsupported() {
        let server = MockServer::start().await;
        let err = adapter(&server, &["111"])
            .lookup(&QueryTerm::Title("클린 코드".into()), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Unsupported(_)));
    }

    #[tokio::test]
    async fn branch_errors_never_expose_auth_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = http::build_client(&SearchConfig::default()).expect("client");
        let codes = vec!["111".to_string(), "222".to_string()];
        let library = PublicLibraryAdapter::new(client, "LIBSECRETKEY", server.uri(), &codes);

        let err = library
            .lookup(&QueryTerm::Identifier(ISBN.into()), 10)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("returned status 503"), "{message}");
        assert!(!message.contains("LIBSECRETKEY"), "{message}");
    }
}
