//! SurrealDB-backed storage for sites, plus the cached host resolution path
//! used by the storefront on every request.

use crate::error::{TenancyError, TenancyErrorExt};
use crate::models::{CreateSite, Site, UpdateSite};
use fhub_database::surrealdb::sql::Datetime;
use fhub_database::{Database, RecordId, record_key};
use fhub_domain::capabilities::Tier;
use fhub_domain::constants::{MEMBERSHIP, SITE, USER};
use fhub_kernel::safe_nanoid;
use moka::sync::Cache;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Host lookups happen on every storefront request; the TTL bounds staleness
/// for changes made outside this process.
const HOST_CACHE_CAPACITY: u64 = 1024;
const HOST_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct SiteRow {
    id: RecordId,
    name: String,
    slug: String,
    hosts: Vec<String>,
    tier: String,
    features: Value,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Self {
            id: row.id.to_string(),
            name: row.name,
            slug: row.slug,
            hosts: row.hosts,
            tier: Tier::from(row.tier.as_str()),
            features: row.features,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

/// Site storage with an in-process host resolution cache.
#[derive(Debug, Clone)]
pub struct SiteRepository {
    db: Database,
    hosts: Cache<String, Site>,
}

impl SiteRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        let hosts = Cache::builder()
            .max_capacity(HOST_CACHE_CAPACITY)
            .time_to_live(HOST_CACHE_TTL)
            .build();
        Self { db, hosts }
    }

    /// Creates a site with a generated id and makes `owner_id` its owner, in
    /// one transaction.
    ///
    /// # Errors
    /// [`TenancyError::Validation`] for malformed input, [`TenancyError::Conflict`]
    /// when the slug is taken, [`TenancyError::Surreal`] on storage failure.
    pub async fn create(&self, req: CreateSite, owner_id: &str) -> Result<Site, TenancyError> {
        req.validate()?;
        if self.slug_taken(&req.slug).await? {
            return Err(TenancyError::Conflict {
                message: format!("Slug `{}` is already in use", req.slug).into(),
                context: None,
            });
        }

        let hosts: Vec<String> = req.hosts.iter().map(|h| normalize_host(h)).collect();
        let mut response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 CREATE type::thing('{SITE}', $id) SET name = $name, slug = $slug, \
                 hosts = $hosts, tier = $tier, features = $features, \
                 created_at = time::now(), updated_at = time::now(); \
                 CREATE type::thing('{MEMBERSHIP}', [$id, $owner]) SET \
                 site = type::thing('{SITE}', $id), user = type::thing('{USER}', $owner), \
                 role = 'owner', created_at = time::now(), updated_at = time::now(); \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", safe_nanoid!()))
            .bind(("name", req.name))
            .bind(("slug", req.slug))
            .bind(("hosts", hosts))
            .bind(("tier", req.tier.as_str()))
            .bind(("features", req.features))
            .bind(("owner", record_key(owner_id).to_owned()))
            .await
            .context("Creating site")?;
        let rows: Vec<SiteRow> = response.take(0).context("Decoding created site")?;

        rows.into_iter().next().map(Site::from).ok_or_else(|| TenancyError::Internal {
            message: "Create returned no record".into(),
            context: None,
        })
    }

    /// Loads one site by record id.
    ///
    /// # Errors
    /// [`TenancyError::NotFound`] if no such site exists.
    pub async fn get(&self, id: &str) -> Result<Site, TenancyError> {
        let row: Option<SiteRow> =
            self.db.select((SITE, record_key(id))).await.context("Loading site")?;
        row.map(Site::from).ok_or_else(|| not_found(id))
    }

    /// Sites the user belongs to, newest first.
    ///
    /// # Errors
    /// [`TenancyError::Surreal`] on storage failure.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Site>, TenancyError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {SITE} WHERE id INSIDE \
                 (SELECT VALUE site FROM {MEMBERSHIP} WHERE user = $user) \
                 ORDER BY created_at DESC"
            ))
            .bind(("user", RecordId::from_table_key(USER, record_key(user_id))))
            .await
            .context("Listing sites")?;
        let rows: Vec<SiteRow> = response.take(0).context("Decoding site list")?;
        Ok(rows.into_iter().map(Site::from).collect())
    }

    /// Applies a partial update and invalidates host cache entries for both
    /// the previous and the new host set.
    ///
    /// # Errors
    /// [`TenancyError::NotFound`] if no such site exists,
    /// [`TenancyError::Validation`] for malformed fields.
    pub async fn update(&self, id: &str, patch: UpdateSite) -> Result<Site, TenancyError> {
        patch.validate()?;
        let before = self.get(id).await?;

        let hosts: Option<Vec<String>> =
            patch.hosts.map(|hosts| hosts.iter().map(|h| normalize_host(h)).collect());
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{SITE}', $id) SET \
                 name = $name ?? name, hosts = $hosts ?? hosts, tier = $tier ?? tier, \
                 features = $features ?? features, updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("name", patch.name))
            .bind(("hosts", hosts))
            .bind(("tier", patch.tier.map(Tier::as_str)))
            .bind(("features", patch.features))
            .await
            .context("Updating site")?;
        let rows: Vec<SiteRow> = response.take(0).context("Decoding updated site")?;
        let site = rows.into_iter().next().map(Site::from).ok_or_else(|| not_found(id))?;

        self.forget_hosts(before.hosts.iter().chain(site.hosts.iter()));
        Ok(site)
    }

    /// Deletes a site and drops its cached hosts.
    ///
    /// # Errors
    /// [`TenancyError::NotFound`] if no such site exists.
    pub async fn delete(&self, id: &str) -> Result<Site, TenancyError> {
        let row: Option<SiteRow> =
            self.db.delete((SITE, record_key(id))).await.context("Deleting site")?;
        let site = row.map(Site::from).ok_or_else(|| not_found(id))?;
        self.forget_hosts(site.hosts.iter());
        debug!(site = %site.id, "Site deleted");
        Ok(site)
    }

    /// Exact match against the `hosts` array, cached.
    ///
    /// # Errors
    /// [`TenancyError::Surreal`] on storage failure.
    pub async fn find_by_host(&self, host: &str) -> Result<Option<Site>, TenancyError> {
        let host = normalize_host(host);
        if let Some(hit) = self.hosts.get(&host) {
            return Ok(Some(hit));
        }

        let mut response = self
            .db
            .query(format!("SELECT * FROM {SITE} WHERE hosts CONTAINS $host LIMIT 1"))
            .bind(("host", host.clone()))
            .await
            .context("Resolving host")?;
        let rows: Vec<SiteRow> = response.take(0).context("Decoding host lookup")?;

        let site = rows.into_iter().next().map(Site::from);
        if let Some(site) = &site {
            self.hosts.insert(host, site.clone());
        }
        Ok(site)
    }

    /// Looks a site up by its unique slug.
    ///
    /// # Errors
    /// [`TenancyError::Surreal`] on storage failure.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Site>, TenancyError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {SITE} WHERE slug = $slug LIMIT 1"))
            .bind(("slug", slug.to_owned()))
            .await
            .context("Resolving slug")?;
        let rows: Vec<SiteRow> = response.take(0).context("Decoding slug lookup")?;
        Ok(rows.into_iter().next().map(Site::from))
    }

    /// Storefront resolution: exact host match first, then the first host
    /// label as a slug (`acme.funnelhub.app` falls back to slug `acme`).
    ///
    /// # Errors
    /// [`TenancyError::Surreal`] on storage failure.
    pub async fn resolve_host(&self, host: &str) -> Result<Option<Site>, TenancyError> {
        let host = normalize_host(host);
        if let Some(site) = self.find_by_host(&host).await? {
            return Ok(Some(site));
        }
        match host.split_once('.') {
            Some((label, _)) if !label.is_empty() => self.find_by_slug(label).await,
            _ => Ok(None),
        }
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, TenancyError> {
        let mut response = self
            .db
            .query(format!("SELECT VALUE id FROM {SITE} WHERE slug = $slug"))
            .bind(("slug", slug.to_owned()))
            .await
            .context("Checking slug")?;
        let ids: Vec<RecordId> = response.take(0).context("Decoding slug check")?;
        Ok(!ids.is_empty())
    }

    fn forget_hosts<'a>(&self, hosts: impl Iterator<Item = &'a String>) {
        for host in hosts {
            self.hosts.invalidate(host);
        }
    }
}

fn not_found(id: &str) -> TenancyError {
    TenancyError::NotFound {
        message: format!("Site `{id}` does not exist").into(),
        context: None,
    }
}

/// Lowercases and strips any port so `Acme.App:443` and `acme.app` key the
/// same cache entry.
fn normalize_host(host: &str) -> String {
    let bare = host.rsplit_once(':').map_or(host, |(name, _)| name);
    bare.to_ascii_lowercase()
}
