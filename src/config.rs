//! Host configuration loaded from a TOML file.
//!
//! ```toml
//! [search]
//! timeout_seconds = 15
//! max_results_per_source = 5
//!
//! [[sources]]
//! name = "shelf"
//! adapter = "local_holdings"
//! priority = 1
//! enabled = true
//! books_dir = "/home/me/Books"
//!
//! [[sources]]
//! name = "aladin"
//! adapter = "bookstore"
//! priority = 3
//! enabled = true
//! ```
//!
//! Credentials may be left out of the file. Missing ones are filled from the
//! environment by [`AppConfig::resolve_credentials`].

use std::path::{Path, PathBuf};

use bookfinder_search::{AdapterSettings, SearchConfig, SourceConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable holding the public library API key.
pub const LIBRARY_API_KEY: &str = "LIBRARY_API_KEY";
/// Environment variable holding the bookstore TTB key.
pub const BOOKSTORE_TTB_KEY: &str = "ALADIN_TTB_KEY";
pub const SUBSCRIPTION_ORG_NAME: &str = "BOOKERS_ORG_NAME";
pub const SUBSCRIPTION_ORG_CODE: &str = "BOOKERS_ORG_CODE";
pub const SUBSCRIPTION_USERNAME: &str = "BOOKERS_USERNAME";
pub const SUBSCRIPTION_PASSWORD: &str = "BOOKERS_PASSWORD";

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`](crate::error::AppError::Config) on malformed
    /// TOML or unknown adapters.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, else the default path if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path cannot be loaded, or the default
    /// file exists but is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default = Self::default_config_path();
        if default.is_file() {
            tracing::debug!(path = %default.display(), "loading default config");
            Self::from_file(&default)
        } else {
            tracing::debug!("no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns the default config file path: `~/.config/bookfinder/config.toml`.
    pub fn default_config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("bookfinder").join("config.toml"),
            None => PathBuf::from("/tmp/bookfinder-config/config.toml"),
        }
    }

    /// Validate the global settings and every source entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`](crate::error::AppError::Search) wrapping the
    /// first configuration problem.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        bookfinder_search::config::validate_sources(&self.sources)?;
        Ok(())
    }

    /// Fill credentials missing from the file using process environment variables.
    pub fn resolve_credentials(&mut self) {
        self.resolve_credentials_with(|name| std::env::var(name).ok());
    }

    /// Fill credentials missing from the file using `lookup`.
    ///
    /// Values already present in the file win. Blank values count as missing.
    pub fn resolve_credentials_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut Option<String>, var: &str| {
            if slot.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                return;
            }
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        };

        for source in &mut self.sources {
            match &mut source.settings {
                AdapterSettings::PublicLibrary { api_key, .. } => fill(api_key, LIBRARY_API_KEY),
                AdapterSettings::Bookstore { ttb_key, .. } => fill(ttb_key, BOOKSTORE_TTB_KEY),
                AdapterSettings::Subscription {
                    org_name,
                    org_code,
                    username,
                    password,
                    ..
                } => {
                    fill(org_name, SUBSCRIPTION_ORG_NAME);
                    fill(org_code, SUBSCRIPTION_ORG_CODE);
                    fill(username, SUBSCRIPTION_USERNAME);
                    fill(password, SUBSCRIPTION_PASSWORD);
                }
                AdapterSettings::LocalHoldings { .. }
                | AdapterSettings::EbookLibrary { .. }
                | AdapterSettings::Storefront { .. } => {}
            }
        }
    }
}
