//! # bookfinder-search
//!
//! Concurrent book availability search across heterogeneous sources.
//!
//! A query (an ISBN, or a free-text title resolved to one through a catalog
//! lookup) is dispatched to every enabled source at once: local e-book
//! holdings, public library branches, an online bookstore, a subscription
//! e-book service, an institutional e-book library and a digital
//! storefront. The per-source outcomes are
//! merged into one priority-ordered response.
//!
//! ## Design
//!
//! - One task per enabled source, each under its own deadline; a slow or
//!   failing source never blocks or aborts the others
//! - Every enabled source is always accounted for, successful or not
//! - Results are ordered by configured priority, ties in registration order
//! - In-memory TTL cache with single-flight de-duplication per key
//! - Authenticated sessions are pooled, capped and re-established once on
//!   expiry
//!
//! ## Security
//!
//! - Credentials never appear in error messages or logs
//! - No network listeners: this is a library, not a server
//! - Query text is logged only at trace level

pub mod adapter;
pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod query;
pub mod registry;
pub mod resolution;
pub mod session;
pub mod types;

use std::sync::Arc;

pub use adapter::{execute, QueryTerm, SourceAdapter};
pub use cache::{CacheKey, ResultCache};
pub use config::{AdapterSettings, SearchConfig, SourceConfig};
pub use coordinator::{SearchCoordinator, SearchRequest, SearchResponse};
pub use error::{Result, SearchError};
pub use query::{QueryClass, SearchQuery};
pub use registry::SourceRegistry;
pub use resolution::{CandidateCatalog, Resolution};
pub use session::{SessionLease, SessionPool};
pub use types::{
    AdapterCapabilities, AggregatedResult, BookRecord, Candidate, CandidateList, SourceDescriptor,
    SourceKind, SourceOutcome, SourcesOverview,
};

/// Build a coordinator from configuration.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the configuration is invalid or an
/// enabled source is missing a credential.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> bookfinder_search::Result<()> {
/// use bookfinder_search::{SearchConfig, SearchRequest, SearchResponse};
///
/// let coordinator = bookfinder_search::coordinator(&[], SearchConfig::default())?;
/// match coordinator.handle(SearchRequest::new("9788966261161")).await? {
///     SearchResponse::Results(result) => println!("{} sources", result.searched_sources),
///     SearchResponse::Candidates(list) => println!("{} candidates", list.total_count),
/// }
/// # Ok(())
/// # }
/// ```
pub fn coordinator(sources: &[SourceConfig], config: SearchConfig) -> Result<SearchCoordinator> {
    let registry = SourceRegistry::from_config(sources, &config)?;
    Ok(SearchCoordinator::new(Arc::new(registry), config))
}
