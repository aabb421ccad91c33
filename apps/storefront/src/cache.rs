//! In-process caches for resolved sites and rendered pages.

use axum::body::Bytes;
use fhub_domain::config::CacheConfig;
use fhub_tenancy::models::Site;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Rendered documents keyed by `(site id, normalized path)`.
///
/// Values are whole HTML documents as `Bytes`, so a cache hit is served
/// without copying the body again.
#[derive(Debug, Clone)]
pub struct PageCache {
    pages: Cache<(String, String), Bytes>,
}

impl PageCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let pages = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { pages }
    }

    #[must_use]
    pub fn get(&self, site_id: &str, path: &str) -> Option<Bytes> {
        self.pages.get(&(site_id.to_owned(), path.to_owned()))
    }

    pub fn insert(&self, site_id: &str, path: &str, html: Bytes) {
        self.pages.insert((site_id.to_owned(), path.to_owned()), html);
    }

    /// Drops specific paths for a site, returning how many were present.
    pub fn purge_paths(&self, site_id: &str, paths: &[String]) -> u64 {
        let mut purged = 0;
        for path in paths {
            let key = (site_id.to_owned(), path.clone());
            if self.pages.remove(&key).is_some() {
                purged += 1;
            }
        }
        purged
    }

    /// Drops everything cached for a site, returning how many entries went.
    pub fn purge_site(&self, site_id: &str) -> u64 {
        let keys: Vec<_> = self
            .pages
            .iter()
            .filter(|(key, _)| key.0 == site_id)
            .map(|(key, _)| key)
            .collect();
        let mut purged = 0;
        for key in keys {
            if self.pages.remove(&*key).is_some() {
                purged += 1;
            }
        }
        purged
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.pages.run_pending_tasks();
        self.pages.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Host → site lookups, so the API is not consulted on every request.
#[derive(Debug, Clone)]
pub struct SiteCache {
    sites: Cache<String, Arc<Site>>,
}

impl SiteCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let sites = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { sites }
    }

    #[must_use]
    pub fn get(&self, host: &str) -> Option<Arc<Site>> {
        self.sites.get(host)
    }

    pub fn insert(&self, host: &str, site: Arc<Site>) {
        self.sites.insert(host.to_owned(), site);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> PageCache {
        PageCache::new(&CacheConfig { capacity: 64, ttl_seconds: 60 })
    }

    #[test]
    fn path_purge_counts_only_present_entries() {
        let cache = cache();
        cache.insert("site:a", "/", Bytes::from_static(b"<html/>"));
        cache.insert("site:a", "/pricing", Bytes::from_static(b"<html/>"));

        let purged =
            cache.purge_paths("site:a", &["/pricing".to_owned(), "/missing".to_owned()]);
        assert_eq!(purged, 1);
        assert!(cache.get("site:a", "/").is_some());
        assert!(cache.get("site:a", "/pricing").is_none());
    }

    #[test]
    fn site_purge_leaves_other_sites_alone() {
        let cache = cache();
        cache.insert("site:a", "/", Bytes::from_static(b"a"));
        cache.insert("site:a", "/x", Bytes::from_static(b"a"));
        cache.insert("site:b", "/", Bytes::from_static(b"b"));

        assert_eq!(cache.purge_site("site:a"), 2);
        assert!(cache.get("site:a", "/").is_none());
        assert!(cache.get("site:b", "/").is_some());
    }
}
