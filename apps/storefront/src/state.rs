//! Shared storefront state.

use crate::api::ApiClient;
use crate::cache::{PageCache, SiteCache};
use crate::error::StorefrontError;
use fhub_domain::config::StorefrontConfig;
use fhub_rendering::RendererRegistry;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug)]
pub struct AppStateInner {
    pub config: StorefrontConfig,
    pub api: ApiClient,
    /// Host → site lookups.
    pub sites: SiteCache,
    /// Rendered published documents.
    pub pages: PageCache,
    pub registry: RendererRegistry,
}

/// Cheaply cloneable handle shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    /// # Errors
    /// Fails if the API client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(&config.api)?;
        let sites = SiteCache::new(&config.cache);
        let pages = PageCache::new(&config.cache);
        let registry = RendererRegistry::with_defaults();
        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, sites, pages, registry }),
        })
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
