//! In-memory TTL cache for aggregated search results.
//!
//! Keyed by the normalised query, the resolved identifier and the per-source
//! result cap. Uses [`moka`] for async-friendly caching with a configurable
//! TTL and bounded capacity. [`ResultCache::get_or_compute`] goes through
//! moka's entry API so concurrent callers for the same key share a single
//! fan-out.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;

use crate::query::SearchQuery;
use crate::types::AggregatedResult;

/// Composite cache key for one resolved search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed raw query.
    query: String,
    /// Resolved identifier, if any.
    identifier: Option<String>,
    /// Per-source result cap the search ran with.
    max_results: usize,
}

impl CacheKey {
    /// Build a deterministic key for `query` searched with `max_results`.
    pub fn new(query: &SearchQuery, max_results: usize) -> Self {
        Self {
            query: query.normalized(),
            identifier: query.identifier().map(str::to_string),
            max_results,
        }
    }
}

/// Shared result cache. Cloning is cheap and clones share storage.
///
/// A zero TTL disables caching: every lookup misses and inserts are dropped.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<CacheKey, AggregatedResult>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up a live entry. Expired entries are never returned.
    pub async fn get(&self, key: &CacheKey) -> Option<AggregatedResult> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    /// Store `value`, replacing any previous entry for `key`.
    pub async fn put(&self, key: CacheKey, value: AggregatedResult) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value).await;
        }
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// output.
    ///
    /// While one caller computes, other callers for the same key wait for
    /// that result instead of starting their own. The flag is `true` when
    /// the value came from the cache or from another caller's computation.
    pub async fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> (AggregatedResult, bool)
    where
        F: Future<Output = AggregatedResult>,
    {
        match &self.inner {
            Some(cache) => {
                let entry = cache.entry(key).or_insert_with(compute).await;
                let cached = !entry.is_fresh();
                (entry.into_value(), cached)
            }
            None => (compute.await, false),
        }
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: &CacheKey) {
        if let Some(cache) = &self.inner {
            cache.invalidate(key).await;
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
