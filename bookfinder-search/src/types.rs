//! Core types: source descriptors, book records, per-source outcomes and the
//! aggregated response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Error message recorded for an adapter abandoned at its deadline.
pub const TIMEOUT_MESSAGE: &str = "timeout";

/// How a source retrieves its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Plain REST API calls.
    Api,
    /// Authenticated session against dynamically rendered pages.
    AuthenticatedScrape,
    /// Public HTML pages parsed without a login.
    Scrape,
    /// Local filesystem scan, no network.
    LocalScan,
}

impl SourceKind {
    /// Returns the human-readable name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::AuthenticatedScrape => "authenticated_scrape",
            Self::Scrape => "scrape",
            Self::LocalScan => "local_scan",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one configured source.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Display name, unique within a registry.
    pub name: String,
    /// Ascending: lower values are listed first.
    pub priority: i32,
    /// Disabled sources are counted but never invoked.
    pub enabled: bool,
    /// Per-source deadline; the effective deadline is the minimum of this
    /// and the global timeout.
    pub timeout: Option<Duration>,
    /// Retrieval mechanism.
    pub kind: SourceKind,
}

impl SourceDescriptor {
    /// Create an enabled descriptor with no timeout override.
    pub fn new(name: impl Into<String>, priority: i32, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
            timeout: None,
            kind,
        }
    }

    /// Builder-style enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder-style timeout override.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Effective deadline for this source under the given global timeout.
    pub fn effective_timeout(&self, global: Duration) -> Duration {
        match self.timeout {
            Some(own) => own.min(global),
            None => global,
        }
    }
}

/// Which query forms an adapter can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCapabilities {
    /// Can look a book up by ISBN.
    pub supports_identifier: bool,
    /// Can match by title / keyword.
    pub supports_title: bool,
}

impl AdapterCapabilities {
    /// Identifier and title lookups.
    pub const BOTH: Self = Self {
        supports_identifier: true,
        supports_title: true,
    };
    /// Identifier lookups only.
    pub const IDENTIFIER_ONLY: Self = Self {
        supports_identifier: true,
        supports_title: false,
    };
    /// Title / keyword matching only.
    pub const TITLE_ONLY: Self = Self {
        supports_identifier: false,
        supports_title: true,
    };
}

/// A single normalized book hit from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// Free-form availability status, e.g. `"available"`, `"on loan"`, `"owned"`.
    pub availability: Option<String>,
    /// Reference URL, or a local path for holdings on disk.
    pub url: Option<String>,
    /// Source-specific attributes. Ordered so serialized output is stable.
    #[serde(default)]
    pub additional_info: BTreeMap<String, serde_json::Value>,
}

impl BookRecord {
    /// Create a record with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Insert a source-specific attribute, skipping empty strings.
    pub fn with_info(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let value = value.into();
        let empty = matches!(&value, serde_json::Value::String(s) if s.is_empty());
        if !empty {
            self.additional_info.insert(key.to_string(), value);
        }
        self
    }
}

/// The outcome of one adapter execution within one search.
///
/// Fields are private so that a failed outcome can never carry results:
/// [`SourceOutcome::failed`] is the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome {
    source_name: String,
    priority: i32,
    success: bool,
    error_message: Option<String>,
    results: Vec<BookRecord>,
    result_count: usize,
    elapsed_ms: u64,
}

impl SourceOutcome {
    /// A successful execution. `results` may be empty ("found nothing").
    pub fn succeeded(
        source_name: impl Into<String>,
        priority: i32,
        results: Vec<BookRecord>,
        elapsed: Duration,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            priority,
            success: true,
            error_message: None,
            result_count: results.len(),
            results,
            elapsed_ms: duration_ms(elapsed),
        }
    }

    /// A failed execution. Never carries results.
    pub fn failed(
        source_name: impl Into<String>,
        priority: i32,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            priority,
            success: false,
            error_message: Some(error.into()),
            results: Vec::new(),
            result_count: 0,
            elapsed_ms: duration_ms(elapsed),
        }
    }

    /// An execution abandoned at its deadline.
    pub fn timed_out(source_name: impl Into<String>, priority: i32, elapsed: Duration) -> Self {
        Self::failed(source_name, priority, TIMEOUT_MESSAGE, elapsed)
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn results(&self) -> &[BookRecord] {
        &self.results
    }

    pub fn result_count(&self) -> usize {
        self.result_count
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Whether this outcome records a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        self.error_message.as_deref() == Some(TIMEOUT_MESSAGE)
    }
}

/// The final response for one resolved query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    /// The raw query as the caller submitted it.
    pub query: String,
    /// Resolved ISBN, if any.
    pub isbn: Option<String>,
    /// Resolved canonical title, if any.
    pub selected_title: Option<String>,
    /// Every registered source, enabled or not.
    pub total_sources: usize,
    /// Sources actually invoked.
    pub searched_sources: usize,
    /// Ascending by priority, ties in registration order.
    pub sources: Vec<SourceOutcome>,
    /// Slowest adapter's elapsed time; dispatch is parallel.
    pub elapsed_ms: u64,
}

impl AggregatedResult {
    /// Outcome for the named source, if it was searched.
    pub fn source(&self, name: &str) -> Option<&SourceOutcome> {
        self.sources.iter().find(|o| o.source_name() == name)
    }

    /// Number of sources that succeeded.
    pub fn succeeded_count(&self) -> usize {
        self.sources.iter().filter(|o| o.is_success()).count()
    }
}

/// One Step-1 catalog hit offered to the caller for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// ISBN-13 when the catalog has one, ISBN-10 otherwise.
    pub isbn: String,
    pub title: String,
    /// Title without subtitle, used for title matching in other sources.
    pub main_title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub pub_date: Option<String>,
    pub cover: Option<String>,
    pub link: Option<String>,
}

/// Step-1 response listing candidates for an ambiguous query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    pub query: String,
    pub total_count: usize,
    pub books: Vec<Candidate>,
}

/// Read-only view of one registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    pub kind: SourceKind,
    pub supports_identifier: bool,
    pub supports_title: bool,
}

/// Overview of every registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcesOverview {
    pub total_count: usize,
    pub enabled_count: usize,
    pub sources: Vec<SourceInfo>,
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
