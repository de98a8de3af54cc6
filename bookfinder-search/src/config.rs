//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] holds the global knobs (timeouts, result caps, caching,
//! session pool size). [`SourceConfig`] describes one source and carries the
//! adapter-specific parameters in [`AdapterSettings`]. Both are plain data:
//! the host reads them from a file and hands an immutable snapshot to the
//! registry and coordinator.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::{SourceDescriptor, SourceKind};

/// Global configuration for a search coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Global per-search deadline in seconds. Per-source overrides can only
    /// shorten it.
    pub timeout_seconds: u64,
    /// Default cap on records emitted by each source.
    pub max_results_per_source: usize,
    /// Number of candidates requested from the catalog in Step 1.
    pub candidate_limit: usize,
    /// How long to cache aggregated results in seconds. Set to 0 to disable caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached aggregated results.
    pub cache_capacity: u64,
    /// Hard cap on concurrent authenticated sessions per subscription source.
    pub max_sessions: usize,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            max_results_per_source: 5,
            candidate_limit: 10,
            cache_ttl_seconds: 600,
            cache_capacity: 256,
            max_sessions: 2,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Global deadline as a [`Duration`].
    pub fn global_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - `max_results_per_source` must be greater than 0
    /// - `candidate_limit` must be greater than 0
    /// - `max_sessions` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_results_per_source == 0 {
            return Err(SearchError::Config(
                "max_results_per_source must be greater than 0".into(),
            ));
        }
        if self.candidate_limit == 0 {
            return Err(SearchError::Config(
                "candidate_limit must be greater than 0".into(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(SearchError::Config(
                "max_sessions must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// One configured source: shared fields plus adapter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Sources are enabled unless the entry says `enabled = false`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Optional per-source deadline override in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(flatten)]
    pub settings: AdapterSettings,
}

fn default_priority() -> i32 {
    999
}

fn default_enabled() -> bool {
    true
}

/// Adapter-specific parameters, selected by the `adapter` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "adapter", rename_all = "snake_case")]
pub enum AdapterSettings {
    /// E-book files on local disk.
    LocalHoldings {
        books_dir: PathBuf,
        #[serde(default = "default_extensions")]
        extensions: Vec<String>,
    },
    /// Public library holdings lookup across a list of branch codes.
    PublicLibrary {
        #[serde(default)]
        api_key: Option<String>,
        libraries: Vec<String>,
        #[serde(default = "default_library_base_url")]
        base_url: String,
    },
    /// Online bookstore catalog; also the Step-1 candidate catalog.
    Bookstore {
        #[serde(default)]
        ttb_key: Option<String>,
        #[serde(default = "default_bookstore_base_url")]
        base_url: String,
    },
    /// Subscription e-book library behind an institutional login.
    Subscription {
        #[serde(default)]
        org_name: Option<String>,
        #[serde(default)]
        org_code: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_subscription_base_url")]
        base_url: String,
    },
    /// Institutional e-book library with a public search page.
    EbookLibrary {
        #[serde(default = "default_ebook_library_base_url")]
        base_url: String,
    },
    /// Digital storefront keyword search.
    Storefront {
        #[serde(default = "default_storefront_api_url")]
        api_url: String,
        #[serde(default = "default_storefront_web_url")]
        web_url: String,
        #[serde(default = "default_storefront_site")]
        site: String,
    },
}

impl AdapterSettings {
    /// Retrieval mechanism implied by the adapter variant.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::LocalHoldings { .. } => SourceKind::LocalScan,
            Self::Subscription { .. } => SourceKind::AuthenticatedScrape,
            Self::EbookLibrary { .. } => SourceKind::Scrape,
            Self::PublicLibrary { .. } | Self::Bookstore { .. } | Self::Storefront { .. } => {
                SourceKind::Api
            }
        }
    }

    /// The `adapter` tag of this variant.
    pub fn adapter_name(&self) -> &'static str {
        match self {
            Self::LocalHoldings { .. } => "local_holdings",
            Self::PublicLibrary { .. } => "public_library",
            Self::Bookstore { .. } => "bookstore",
            Self::Subscription { .. } => "subscription",
            Self::EbookLibrary { .. } => "ebook_library",
            Self::Storefront { .. } => "storefront",
        }
    }
}

pub(crate) fn default_extensions() -> Vec<String> {
    ["pdf", "epub", "mobi", "azw", "azw3", "djvu"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_library_base_url() -> String {
    "http://data4library.kr/api".into()
}

fn default_bookstore_base_url() -> String {
    "http://www.aladin.co.kr/ttb/api".into()
}

fn default_subscription_base_url() -> String {
    "https://www.bookers.life".into()
}

fn default_ebook_library_base_url() -> String {
    "https://ssafy.dkyobobook.co.kr".into()
}

fn default_storefront_api_url() -> String {
    "https://search-api.ridibooks.com".into()
}

fn default_storefront_web_url() -> String {
    "https://ridibooks.com".into()
}

fn default_storefront_site() -> String {
    "ridi-select".into()
}

impl SourceConfig {
    /// The immutable descriptor for this source.
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name.clone(),
            priority: self.priority,
            enabled: self.enabled,
            timeout: self.timeout_seconds.map(Duration::from_secs),
            kind: self.settings.kind(),
        }
    }

    /// Validates the shared fields and the adapter parameters that do not
    /// depend on credentials.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.name.trim().is_empty() {
            return Err(SearchError::Config("source name must not be empty".into()));
        }
        if self.timeout_seconds == Some(0) {
            return Err(SearchError::Config(format!(
                "{}: timeout_seconds must be greater than 0",
                self.name
            )));
        }
        match &self.settings {
            AdapterSettings::LocalHoldings { books_dir, .. }
                if books_dir.as_os_str().is_empty() =>
            {
                Err(SearchError::Config(format!(
                    "{}: books_dir must not be empty",
                    self.name
                )))
            }
            AdapterSettings::PublicLibrary { libraries, .. }
                if libraries.iter().all(|code| code.trim().is_empty()) =>
            {
                Err(SearchError::Config(format!(
                    "{}: at least one library code is required",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Validate a whole source list: each entry plus unique names.
///
/// An empty list, or a list with no enabled source, is valid.
pub fn validate_sources(sources: &[SourceConfig]) -> Result<(), SearchError> {
    let mut seen = HashSet::new();
    for source in sources {
        source.validate()?;
        if !seen.insert(source.name.as_str()) {
            return Err(SearchError::Config(format!(
                "duplicate source name: {}",
                source.name
            )));
        }
    }
    Ok(())
}

/// Extract a required credential, naming the missing field in the error.
pub(crate) fn require(
    source: &str,
    field: &str,
    value: &Option<String>,
) -> Result<String, SearchError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SearchError::Config(format!("{source}: missing credential `{field}`")))
}
