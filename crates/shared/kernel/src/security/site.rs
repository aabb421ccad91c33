//! Cached site access context backing the feature and tier guards.
//!
//! A guard decision needs the site's tier and feature flag object. Slices
//! resolve them through [`SiteResolver`] instead of reaching into tenancy
//! storage; site mutations must call [`SiteResolver::invalidate`].

use fhub_database::{Database, DatabaseError, DatabaseErrorExt, record_key};
use fhub_domain::capabilities::Tier;
use fhub_domain::constants::SITE;
use moka::sync::Cache;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const CACHE_CAPACITY: u64 = 4096;
const CACHE_TTL: Duration = Duration::from_secs(60);

/// The slice of a site that guard checks consume.
#[derive(Debug, Clone)]
pub struct SiteAccess {
    pub tier: Tier,
    pub features: Value,
}

#[derive(Debug, Deserialize)]
struct AccessRow {
    tier: String,
    features: Value,
}

/// Resolves tier and feature flags for a site straight from the site table.
#[derive(Debug, Clone)]
pub struct SiteResolver {
    db: Database,
    cache: Cache<String, Option<SiteAccess>>,
}

impl SiteResolver {
    #[must_use]
    pub fn new(db: Database) -> Self {
        let cache =
            Cache::builder().max_capacity(CACHE_CAPACITY).time_to_live(CACHE_TTL).build();
        Self { db, cache }
    }

    /// The site's guard inputs, or `None` when the site does not exist.
    ///
    /// Accepts the `table:key` and bare-key id forms.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Surreal`] if the lookup query fails.
    pub async fn access(&self, site_id: &str) -> Result<Option<SiteAccess>, DatabaseError> {
        let key = record_key(site_id).to_owned();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let mut response = self
            .db
            .query(format!("SELECT tier, features FROM type::thing('{SITE}', $id)"))
            .bind(("id", key.clone()))
            .await
            .context("Loading site access")?;
        let rows: Vec<AccessRow> = response.take(0).context("Decoding site access")?;

        let access = rows.into_iter().next().map(|row| SiteAccess {
            tier: Tier::from(row.tier.as_str()),
            features: row.features,
        });
        self.cache.insert(key, access.clone());
        Ok(access)
    }

    /// Drops the cached entry for one site.
    pub fn invalidate(&self, site_id: &str) {
        self.cache.invalidate(record_key(site_id));
    }
}
