//! Explicit name → adapter registry built from configuration.
//!
//! The set of adapter variants is closed: [`SourceRegistry::from_config`]
//! matches on [`AdapterSettings`] and constructs the matching adapter.
//! Embedders can still add their own adapters with
//! [`SourceRegistry::register`]. Registration order is preserved and breaks
//! priority ties when results are aggregated.

use std::sync::Arc;

use crate::adapter::SourceAdapter;
use crate::adapters::{
    BookstoreAdapter, EbookLibraryAdapter, LocalHoldingsAdapter, PortalBackend,
    PortalCredentials, PublicLibraryAdapter, StorefrontAdapter, SubscriptionAdapter,
};
use crate::config::{require, validate_sources, AdapterSettings, SearchConfig, SourceConfig};
use crate::error::SearchError;
use crate::http;
use crate::resolution::CandidateCatalog;
use crate::types::{SourceDescriptor, SourceInfo, SourcesOverview};

/// One registered source: its immutable descriptor and adapter.
#[derive(Clone)]
pub struct RegisteredSource {
    descriptor: SourceDescriptor,
    adapter: Arc<dyn SourceAdapter>,
}

impl RegisteredSource {
    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn adapter(&self) -> &Arc<dyn SourceAdapter> {
        &self.adapter
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl std::fmt::Debug for RegisteredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredSource")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// All configured sources plus the Step-1 candidate catalog.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: Vec<RegisteredSource>,
    catalog: Option<Arc<dyn CandidateCatalog>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured source.
    ///
    /// Credentials are only required for enabled sources. The first
    /// bookstore with a key also becomes the candidate catalog, even when
    /// it is disabled as a search source.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid or duplicate entries, or
    /// an enabled source missing a credential.
    pub fn from_config(
        sources: &[SourceConfig],
        search: &SearchConfig,
    ) -> Result<Self, SearchError> {
        search.validate()?;
        validate_sources(sources)?;

        let client = http::build_client(search)?;
        let mut registry = Self::new();

        for source in sources {
            let name = source.name.as_str();
            let adapter: Arc<dyn SourceAdapter> = match &source.settings {
                AdapterSettings::LocalHoldings {
                    books_dir,
                    extensions,
                } => Arc::new(LocalHoldingsAdapter::new(books_dir, extensions)),
                AdapterSettings::PublicLibrary {
                    api_key,
                    libraries,
                    base_url,
                } => Arc::new(PublicLibraryAdapter::new(
                    client.clone(),
                    credential(source, "api_key", api_key)?,
                    base_url.as_str(),
                    libraries,
                )),
                AdapterSettings::Bookstore { ttb_key, base_url } => {
                    let store = Arc::new(BookstoreAdapter::new(
                        client.clone(),
                        credential(source, "ttb_key", ttb_key)?,
                        base_url.as_str(),
                    ));
                    let has_key = ttb_key.as_deref().is_some_and(|k| !k.trim().is_empty());
                    if registry.catalog.is_none() && has_key {
                        tracing::debug!(source = name, "using bookstore as candidate catalog");
                        let catalog: Arc<dyn CandidateCatalog> = store.clone();
                        registry.catalog = Some(catalog);
                    }
                    store
                }
                AdapterSettings::Subscription {
                    org_name,
                    org_code,
                    username,
                    password,
                    base_url,
                } => {
                    let credentials = PortalCredentials {
                        org_name: credential(source, "org_name", org_name)?,
                        org_code: credential(source, "org_code", org_code)?,
                        username: credential(source, "username", username)?,
                        password: credential(source, "password", password)?,
                    };
                    let backend =
                        PortalBackend::new(search.clone(), base_url.as_str(), credentials);
                    Arc::new(SubscriptionAdapter::new(backend, search.max_sessions))
                }
                AdapterSettings::EbookLibrary { base_url } => {
                    Arc::new(EbookLibraryAdapter::new(client.clone(), base_url.as_str()))
                }
                AdapterSettings::Storefront {
                    api_url,
                    web_url,
                    site,
                } => Arc::new(StorefrontAdapter::new(
                    client.clone(),
                    api_url.as_str(),
                    web_url.as_str(),
                    site.as_str(),
                )),
            };
            registry.register(source.descriptor(), adapter)?;
        }

        tracing::info!(
            total = registry.len(),
            enabled = registry.enabled_count(),
            catalog = registry.catalog.is_some(),
            "source registry built"
        );
        Ok(registry)
    }

    /// Add a source after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the name is already registered.
    pub fn register(
        &mut self,
        descriptor: SourceDescriptor,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<(), SearchError> {
        if self.sources.iter().any(|s| s.descriptor.name == descriptor.name) {
            return Err(SearchError::Config(format!(
                "duplicate source name: {}",
                descriptor.name
            )));
        }
        self.sources.push(RegisteredSource {
            descriptor,
            adapter,
        });
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with_source(
        mut self,
        descriptor: SourceDescriptor,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<Self, SearchError> {
        self.register(descriptor, adapter)?;
        Ok(self)
    }

    /// Replace the candidate catalog.
    pub fn with_catalog(mut self, catalog: Arc<dyn CandidateCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn catalog(&self) -> Option<&Arc<dyn CandidateCatalog>> {
        self.catalog.as_ref()
    }

    /// Every registered source in registration order.
    pub fn sources(&self) -> &[RegisteredSource] {
        &self.sources
    }

    /// Enabled sources with their registration index.
    pub fn enabled(&self) -> impl Iterator<Item = (usize, &RegisteredSource)> {
        self.sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.descriptor.enabled)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredSource> {
        self.sources.iter().find(|s| s.descriptor.name == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Read-only overview of every source.
    pub fn overview(&self) -> SourcesOverview {
        let sources: Vec<SourceInfo> = self
            .sources
            .iter()
            .map(|s| {
                let caps = s.adapter.capabilities();
                SourceInfo {
                    name: s.descriptor.name.clone(),
                    priority: s.descriptor.priority,
                    enabled: s.descriptor.enabled,
                    kind: s.descriptor.kind,
                    supports_identifier: caps.supports_identifier,
                    supports_title: caps.supports_title,
                }
            })
            .collect();
        SourcesOverview {
            total_count: sources.len(),
            enabled_count: sources.iter().filter(|s| s.enabled).count(),
            sources,
        }
    }
}

/// Enabled sources must carry the credential; disabled ones may leave it blank.
fn credential(
    source: &SourceConfig,
    field: &str,
    value: &Option<String>,
) -> Result<String, SearchError> {
    if source.enabled {
        require(&source.name, field, value)
    } else {
        Ok(value.clone().unwrap_or_default())
    }
}
