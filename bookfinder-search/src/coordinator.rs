//! Search coordinator: resolution, cache, concurrent fan-out and join.
//!
//! # Pipeline
//!
//! 1. Resolve the inbound query (identifier, explicit selection, or the
//!    two-step candidate flow)
//! 2. Check the [`ResultCache`]; concurrent callers for one key share a
//!    single fan-out
//! 3. Spawn one task per enabled source, each under its effective deadline
//! 4. Join every task under a bounded timeout, aborting stragglers
//! 5. Aggregate in priority order and cache the result

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::adapter;
use crate::aggregator::aggregate;
use crate::cache::{CacheKey, ResultCache};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::query::{main_title, SearchQuery};
use crate::registry::SourceRegistry;
use crate::resolution::Resolution;
use crate::types::{AggregatedResult, CandidateList, SourceOutcome, SourcesOverview};

/// Slack allowed between a task's own deadline and its abort.
const JOIN_GRACE: Duration = Duration::from_millis(250);

/// Inbound search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub resolved_identifier: Option<String>,
    #[serde(default)]
    pub resolved_title: Option<String>,
    /// Title without subtitle for title matching. Derived from
    /// `resolved_title` when absent.
    #[serde(default)]
    pub resolved_main_title: Option<String>,
    #[serde(default)]
    pub max_results_per_source: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Attach an explicit candidate selection.
    pub fn with_selection(
        mut self,
        identifier: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        self.resolved_identifier = Some(identifier.into());
        self.resolved_title = Some(title.into());
        self
    }

    /// Override the main title used by title-only sources.
    pub fn with_main_title(mut self, main_title: impl Into<String>) -> Self {
        self.resolved_main_title = Some(main_title.into());
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results_per_source = Some(max);
        self
    }
}

/// Outcome of [`SearchCoordinator::handle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResponse {
    /// The query was resolved and every enabled source searched.
    Results(AggregatedResult),
    /// The query is ambiguous; the caller must pick a candidate.
    Candidates(CandidateList),
}

/// Runs searches against a fixed registry and configuration snapshot.
pub struct SearchCoordinator {
    registry: Arc<SourceRegistry>,
    config: SearchConfig,
    cache: ResultCache,
    global_timeout: Duration,
}

impl SearchCoordinator {
    /// Create a coordinator with a cache sized from `config`.
    pub fn new(registry: Arc<SourceRegistry>, config: SearchConfig) -> Self {
        let cache = ResultCache::new(config.cache_ttl(), config.cache_capacity);
        let global_timeout = config.global_timeout();
        Self {
            registry,
            config,
            cache,
            global_timeout,
        }
    }

    /// Override the global per-search deadline.
    pub fn with_global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    /// Share a cache with other coordinators.
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn global_timeout(&self) -> Duration {
        self.global_timeout
    }

    /// Overview of every registered source.
    pub fn sources(&self) -> SourcesOverview {
        self.registry.overview()
    }

    /// Handle an inbound request end to end.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidState`] for a blank query
    /// - [`SearchError::Config`] for a zero result cap or no candidate
    ///   catalog when one is needed
    /// - the resolution error when candidate lookup fails or finds nothing
    pub async fn handle(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let max_results = request
            .max_results_per_source
            .unwrap_or(self.config.max_results_per_source);
        if max_results == 0 {
            return Err(SearchError::Config(
                "maxResultsPerSource must be greater than 0".into(),
            ));
        }
        if request.query.trim().is_empty() {
            return Err(SearchError::InvalidState("query must not be empty".into()));
        }

        let selected = request
            .resolved_identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(identifier) = selected {
            let title = request.resolved_title.as_deref().unwrap_or_default();
            let main = request
                .resolved_main_title
                .as_deref()
                .unwrap_or_else(|| main_title(title));
            let query = SearchQuery::parse(&request.query)
                .resolved_with(identifier, title)
                .with_search_title(Some(main));
            return self
                .search_with(&query, max_results)
                .await
                .map(SearchResponse::Results);
        }

        match self.resolve(&request.query).await {
            Resolution::Resolved(query) => self
                .search_with(&query, max_results)
                .await
                .map(SearchResponse::Results),
            Resolution::CandidatesPresented { query, candidates } => {
                Ok(SearchResponse::Candidates(CandidateList {
                    query: query.raw().to_string(),
                    total_count: candidates.len(),
                    books: candidates,
                }))
            }
            Resolution::Failed { error, .. } => Err(error),
            Resolution::AwaitingQuery(_) => Err(SearchError::InvalidState(
                "candidate lookup did not run".into(),
            )),
        }
    }

    /// Run Step 1 for `raw`: classify, then look up candidates if needed.
    pub async fn resolve(&self, raw: &str) -> Resolution {
        let mut resolution = Resolution::start(raw);
        if resolution.is_resolved() {
            return resolution;
        }
        match self.registry.catalog() {
            Some(catalog) => {
                if let Err(e) = resolution
                    .lookup(catalog.as_ref(), self.config.candidate_limit)
                    .await
                {
                    resolution.fail(e);
                }
            }
            None => resolution.fail(SearchError::Config(
                "no candidate catalog configured".into(),
            )),
        }
        resolution
    }

    /// List catalog candidates for `raw` without resolving.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] without a catalog, or the catalog's
    /// own error.
    pub async fn candidates(&self, raw: &str) -> Result<CandidateList, SearchError> {
        let catalog = self
            .registry
            .catalog()
            .ok_or_else(|| SearchError::Config("no candidate catalog configured".into()))?;
        let books: Vec<_> = catalog
            .candidates(raw.trim(), self.config.candidate_limit)
            .await?
            .into_iter()
            .filter(|c| !c.isbn.trim().is_empty())
            .collect();
        Ok(CandidateList {
            query: raw.trim().to_string(),
            total_count: books.len(),
            books,
        })
    }

    /// Search a resolved query with the configured result cap.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidState`] if the query is not resolved.
    pub async fn search(&self, query: &SearchQuery) -> Result<AggregatedResult, SearchError> {
        self.search_with(query, self.config.max_results_per_source).await
    }

    /// Search a resolved query, emitting at most `max_results` per source.
    ///
    /// Never fails because of a source: every enabled source is accounted
    /// for in the result, successful or not.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidState`] if the query is not resolved.
    pub async fn search_with(
        &self,
        query: &SearchQuery,
        max_results: usize,
    ) -> Result<AggregatedResult, SearchError> {
        if !query.is_resolved() {
            return Err(SearchError::InvalidState(
                "query must be resolved before searching".into(),
            ));
        }
        tracing::trace!(query = query.raw(), isbn = ?query.identifier(), "search");

        let key = CacheKey::new(query, max_results);
        let (result, cached) = self
            .cache
            .get_or_compute(key, self.fan_out(query, max_results))
            .await;
        if cached {
            tracing::debug!("search served from cache");
        }
        Ok(result)
    }

    /// Search a single source by name, bypassing the cache.
    ///
    /// The source is queried even when it is disabled, and the query does
    /// not need to be resolved: a title goes to the source as typed.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotFound`] if no source has that name.
    pub async fn search_source(
        &self,
        name: &str,
        query: &SearchQuery,
        max_results: usize,
    ) -> Result<SourceOutcome, SearchError> {
        let source = self
            .registry
            .get(name)
            .ok_or_else(|| SearchError::NotFound(format!("no source named {name}")))?;
        let descriptor = source.descriptor();
        let deadline = descriptor.effective_timeout(self.global_timeout);
        let adapter = source.adapter().as_ref();
        Ok(adapter::execute(adapter, descriptor, query, max_results, deadline).await)
    }

    async fn fan_out(&self, query: &SearchQuery, max_results: usize) -> AggregatedResult {
        let started = Instant::now();

        let tasks: Vec<_> = self
            .registry
            .enabled()
            .map(|(index, source)| {
                let descriptor = source.descriptor().clone();
                let deadline = descriptor.effective_timeout(self.global_timeout);
                let handle = {
                    let adapter = Arc::clone(source.adapter());
                    let descriptor = descriptor.clone();
                    let query = query.clone();
                    tokio::spawn(async move {
                        let adapter = adapter.as_ref();
                        adapter::execute(adapter, &descriptor, &query, max_results, deadline).await
                    })
                };
                (index, descriptor, deadline, handle)
            })
            .collect();

        let joined = join_all(tasks.into_iter().map(
            |(index, descriptor, deadline, mut handle)| async move {
                let name = descriptor.name.as_str();
                let priority = descriptor.priority;
                let outcome = match tokio::time::timeout(deadline + JOIN_GRACE, &mut handle).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => {
                        let reason = if e.is_panic() {
                            "adapter panicked"
                        } else {
                            "adapter task cancelled"
                        };
                        tracing::warn!(source = name, reason, "source task failed");
                        SourceOutcome::failed(name, priority, reason, started.elapsed())
                    }
                    Err(_) => {
                        handle.abort();
                        tracing::warn!(source = name, "source task aborted at deadline");
                        SourceOutcome::timed_out(name, priority, started.elapsed())
                    }
                };
                (index, outcome)
            },
        ))
        .await;

        let result = aggregate(query, self.registry.len(), joined);
        tracing::info!(
            searched = result.searched_sources,
            succeeded = result.succeeded_count(),
            elapsed_ms = result.elapsed_ms,
            "search completed"
        );
        result
    }
}
