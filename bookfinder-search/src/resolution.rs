//! Two-step candidate resolution.
//!
//! A free-text query cannot be fanned out directly: first a catalog lookup
//! produces candidates, then the caller picks one (or the single candidate is
//! taken automatically). Identifier queries skip straight to
//! [`Resolution::Resolved`].
//!
//! ```text
//! AwaitingQuery ──lookup──▶ CandidatesPresented ──select──▶ Resolved
//!       │        (1 hit) ─────────────────────────────────▶    │
//!       └──────────── error / zero hits ──▶ Failed ◀── fail ───┘
//! ```

use async_trait::async_trait;

use crate::error::SearchError;
use crate::query::{main_title, SearchQuery};
use crate::types::Candidate;

/// A catalog able to turn a keyword into a ranked candidate list.
#[async_trait]
pub trait CandidateCatalog: Send + Sync {
    /// Up to `limit` candidates for `keyword`, best match first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the catalog cannot be queried.
    async fn candidates(&self, keyword: &str, limit: usize)
        -> Result<Vec<Candidate>, SearchError>;
}

/// Resolution state of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Free text waiting for a catalog lookup.
    AwaitingQuery(SearchQuery),
    /// Several candidates found; the caller must choose.
    CandidatesPresented {
        query: SearchQuery,
        candidates: Vec<Candidate>,
    },
    /// Ready for the multi-source search.
    Resolved(SearchQuery),
    /// Terminal: the catalog failed or found nothing.
    Failed {
        query: SearchQuery,
        error: SearchError,
    },
}

impl Resolution {
    /// Classify `raw` and enter the initial state.
    pub fn start(raw: &str) -> Self {
        let query = SearchQuery::parse(raw);
        if query.is_resolved() {
            Self::Resolved(query)
        } else {
            Self::AwaitingQuery(query)
        }
    }

    /// Short state name for logs and errors.
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::AwaitingQuery(_) => "awaiting_query",
            Self::CandidatesPresented { .. } => "candidates_presented",
            Self::Resolved(_) => "resolved",
            Self::Failed { .. } => "failed",
        }
    }

    /// The query in whatever state it is.
    pub fn query(&self) -> &SearchQuery {
        match self {
            Self::AwaitingQuery(query)
            | Self::CandidatesPresented { query, .. }
            | Self::Resolved(query)
            | Self::Failed { query, .. } => query,
        }
    }

    /// Presented candidates; empty outside `CandidatesPresented`.
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::CandidatesPresented { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Run the catalog lookup for an awaiting query.
    ///
    /// Zero candidates or a catalog error move to [`Resolution::Failed`];
    /// one candidate resolves immediately. Candidates without an identifier
    /// are dropped since they cannot drive an identifier search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidState`] unless awaiting a query.
    pub async fn lookup(
        &mut self,
        catalog: &dyn CandidateCatalog,
        limit: usize,
    ) -> Result<(), SearchError> {
        let query = match self {
            Self::AwaitingQuery(query) => query.clone(),
            other => return Err(invalid("lookup", other)),
        };

        *self = match catalog.candidates(query.raw(), limit).await {
            Ok(found) => {
                let mut candidates: Vec<Candidate> = found
                    .into_iter()
                    .filter(|c| !c.isbn.trim().is_empty())
                    .collect();
                match candidates.len() {
                    0 => Self::Failed {
                        query,
                        error: SearchError::NotFound("no candidates for query".into()),
                    },
                    1 => {
                        let only = candidates.remove(0);
                        Self::Resolved(apply(query, &only))
                    }
                    n => {
                        tracing::debug!(candidates = n, "query is ambiguous");
                        Self::CandidatesPresented { query, candidates }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "candidate lookup failed");
                Self::Failed { query, error }
            }
        };
        Ok(())
    }

    /// Resolve with an explicit identifier and canonical title.
    ///
    /// When the identifier matches a presented candidate, its main title is
    /// kept for title matching.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidState`] unless candidates are presented
    /// or if `identifier` is blank.
    pub fn select(&mut self, identifier: &str, title: &str) -> Result<(), SearchError> {
        let Self::CandidatesPresented { query, candidates } = self else {
            return Err(invalid("select", self));
        };
        if identifier.trim().is_empty() {
            return Err(SearchError::InvalidState(
                "selection requires an identifier".into(),
            ));
        }

        let known = candidates
            .iter()
            .find(|c| c.isbn == identifier.trim())
            .and_then(|c| c.main_title.clone());
        let search_title = known.unwrap_or_else(|| main_title(title).to_string());
        let resolved = query
            .clone()
            .resolved_with(identifier, title)
            .with_search_title(Some(&search_title));
        *self = Self::Resolved(resolved);
        Ok(())
    }

    /// Resolve with the candidate at `index` (0-based) in the presented list.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidState`] unless candidates are presented,
    /// or [`SearchError::NotFound`] if `index` is out of range.
    pub fn select_index(&mut self, index: usize) -> Result<(), SearchError> {
        let Self::CandidatesPresented { query, candidates } = self else {
            return Err(invalid("select", self));
        };
        let Some(candidate) = candidates.get(index) else {
            return Err(SearchError::NotFound(format!(
                "no candidate at index {index} ({} presented)",
                candidates.len()
            )));
        };
        *self = Self::Resolved(apply(query.clone(), candidate));
        Ok(())
    }

    /// Move to [`Resolution::Failed`] from any non-terminal state.
    pub fn fail(&mut self, error: SearchError) {
        if !matches!(self, Self::Failed { .. }) {
            *self = Self::Failed {
                query: self.query().clone(),
                error,
            };
        }
    }

    /// The resolved query, or the reason there is none.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Ambiguous`] while candidates await selection
    /// - the recorded error for a failed resolution
    /// - [`SearchError::InvalidState`] before lookup
    pub fn into_resolved(self) -> Result<SearchQuery, SearchError> {
        match self {
            Self::Resolved(query) => Ok(query),
            Self::CandidatesPresented { candidates, .. } => Err(SearchError::Ambiguous {
                candidates: candidates.len(),
            }),
            Self::Failed { error, .. } => Err(error),
            Self::AwaitingQuery(_) => Err(SearchError::InvalidState(
                "query has not been looked up yet".into(),
            )),
        }
    }
}

fn apply(query: SearchQuery, candidate: &Candidate) -> SearchQuery {
    query
        .resolved_with(&candidate.isbn, &candidate.title)
        .with_search_title(candidate.main_title.as_deref())
}

fn invalid(action: &str, state: &Resolution) -> SearchError {
    SearchError::InvalidState(format!("cannot {action} in state {}", state.state_name()))
}
