//! # bookfinder
//!
//! Host layer around [`bookfinder_search`]: loads configuration from TOML,
//! fills credentials from the environment and builds a ready
//! [`SearchCoordinator`].
//!
//! The `bookfinder` binary drives the two-step flow from the command line:
//! list candidates for a title, then search every source for the chosen
//! ISBN.

pub mod config;
pub mod error;

pub use bookfinder_search::{SearchCoordinator, SearchQuery, SearchRequest, SearchResponse};
pub use config::AppConfig;
pub use error::{AppError, Result};

/// Resolve credentials, validate and build a coordinator from `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or an enabled source is
/// missing a credential.
pub fn build_coordinator(mut config: AppConfig) -> Result<SearchCoordinator> {
    config.resolve_credentials();
    config.validate()?;
    let enabled = config.sources.iter().filter(|s| s.enabled).count();
    if enabled == 0 {
        tracing::warn!("no source is enabled, searches will return no results");
    }
    Ok(bookfinder_search::coordinator(&config.sources, config.search)?)
}
