//! The source adapter contract.
//!
//! Each source (local holdings, public library, bookstore, subscription
//! service, storefront) implements [`SourceAdapter`]: given a routed
//! [`QueryTerm`] it returns normalized [`BookRecord`]s or an error.
//!
//! Callers never invoke adapters directly. [`execute`] wraps any adapter and
//! guarantees the contract every variant must honour:
//!
//! - the query is routed by the adapter's [`AdapterCapabilities`]
//! - an empty identifier lookup is retried once by title when possible
//! - at most `max_results` records are emitted
//! - every failure becomes a failed [`SourceOutcome`], never an error
//! - the deadline is enforced by dropping the adapter future, so abandoned
//!   work cannot leave partial results behind

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::SearchError;
use crate::query::SearchQuery;
use crate::types::{AdapterCapabilities, BookRecord, SourceDescriptor, SourceOutcome};

/// The term an adapter is asked to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    /// Exact lookup by normalised ISBN.
    Identifier(String),
    /// Fuzzy / substring match on a title or keyword.
    Title(String),
}

impl QueryTerm {
    /// The text of the term regardless of its kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Identifier(s) | Self::Title(s) => s,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "isbn:{s}"),
            Self::Title(s) => write!(f, "title:{s}"),
        }
    }
}

/// A pluggable book source.
///
/// Implementors handle their own request construction, response parsing and
/// session management. They may return any [`SearchError`]; [`execute`]
/// turns it into a failed outcome. All implementations must be
/// `Send + Sync` because every search runs them on separate tasks.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which query forms this adapter can serve.
    fn capabilities(&self) -> AdapterCapabilities;

    /// Look up `term`, returning at most `max_results` records.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the source cannot be reached, its response
    /// cannot be parsed, or its session cannot be (re-)established.
    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError>;
}

/// Pick the term to send to an adapter with the given capabilities.
///
/// Identifier lookups win when both sides allow them; otherwise title
/// matching uses the best available title, falling back to the identifier
/// text and finally the raw query.
///
/// # Errors
///
/// Returns [`SearchError::Unsupported`] when the adapter can only look up
/// identifiers and the query has none.
pub fn route(query: &SearchQuery, caps: AdapterCapabilities) -> Result<QueryTerm, SearchError> {
    if caps.supports_identifier {
        if let Some(isbn) = query.identifier() {
            return Ok(QueryTerm::Identifier(isbn.to_string()));
        }
    }
    if caps.supports_title {
        return Ok(QueryTerm::Title(query.keyword().to_string()));
    }
    Err(SearchError::Unsupported(
        "source requires an ISBN and the query has none".into(),
    ))
}

/// Run one adapter under the contract and produce its outcome.
///
/// Never fails: errors, unsupported queries and deadline expiry all become
/// a failed [`SourceOutcome`].
pub async fn execute(
    adapter: &dyn SourceAdapter,
    descriptor: &SourceDescriptor,
    query: &SearchQuery,
    max_results: usize,
    deadline: Duration,
) -> SourceOutcome {
    let started = Instant::now();
    let name = descriptor.name.as_str();

    match tokio::time::timeout(deadline, lookup_routed(adapter, query, max_results)).await {
        Ok(Ok(mut records)) => {
            records.truncate(max_results);
            tracing::debug!(source = name, count = records.len(), "source returned results");
            SourceOutcome::succeeded(name, descriptor.priority, records, started.elapsed())
        }
        Ok(Err(err)) => {
            tracing::warn!(source = name, error = %err, "source query failed");
            SourceOutcome::failed(name, descriptor.priority, err.to_string(), started.elapsed())
        }
        Err(_) => {
            tracing::warn!(source = name, ?deadline, "source timed out");
            SourceOutcome::timed_out(name, descriptor.priority, started.elapsed())
        }
    }
}

async fn lookup_routed(
    adapter: &dyn SourceAdapter,
    query: &SearchQuery,
    max_results: usize,
) -> Result<Vec<BookRecord>, SearchError> {
    let caps = adapter.capabilities();
    let term = route(query, caps)?;
    tracing::trace!(%term, "source lookup");

    let records = adapter.lookup(&term, max_results).await?;
    if !records.is_empty() || !term.is_identifier() || !caps.supports_title {
        return Ok(records);
    }

    // Identifier lookup found nothing; retry once by title when we know one.
    match query.search_title() {
        Some(title) => {
            tracing::debug!("identifier lookup empty, retrying by title");
            adapter
                .lookup(&QueryTerm::Title(title.to_string()), max_results)
                .await
        }
        None => Ok(records),
    }
}
