//! Cached membership lookups backing the role guard.
//!
//! Handlers resolve the caller's role for a site through [`MembershipResolver`]
//! and feed the result to `RoleGuard::require`. Lookups are cached per
//! (user, site); membership mutations must call
//! [`MembershipResolver::invalidate`] so role changes do not wait out the TTL.

use fhub_database::{Database, DatabaseError, DatabaseErrorExt, RecordId, record_key};
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{MEMBERSHIP, SITE, USER};
use moka::sync::Cache;
use std::time::Duration;

/// Sized for a burst of editor traffic; entries expire quickly because the
/// cache also stores negative results.
const CACHE_CAPACITY: u64 = 4096;
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Resolves a user's role within a site straight from the membership table.
#[derive(Debug, Clone)]
pub struct MembershipResolver {
    db: Database,
    cache: Cache<(String, String), Option<Role>>,
}

impl MembershipResolver {
    #[must_use]
    pub fn new(db: Database) -> Self {
        let cache =
            Cache::builder().max_capacity(CACHE_CAPACITY).time_to_live(CACHE_TTL).build();
        Self { db, cache }
    }

    /// The user's role in the site, or `None` when no membership exists.
    ///
    /// Both ids accept the `table:key` and bare-key forms.
    ///
    /// # Errors
    /// Returns [`DatabaseError::Surreal`] if the lookup query fails.
    pub async fn role(
        &self,
        user_id: &str,
        site_id: &str,
    ) -> Result<Option<Role>, DatabaseError> {
        let key = cache_key(user_id, site_id);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let mut response = self
            .db
            .query(format!(
                "SELECT VALUE role FROM {MEMBERSHIP} WHERE user = $user AND site = $site LIMIT 1"
            ))
            .bind(("user", RecordId::from_table_key(USER, record_key(user_id))))
            .bind(("site", RecordId::from_table_key(SITE, record_key(site_id))))
            .await
            .context("Loading membership")?;
        let roles: Vec<String> = response.take(0).context("Decoding membership role")?;

        let role = roles.first().map(|r| Role::from(r.as_str()));
        self.cache.insert(key, role);
        Ok(role)
    }

    /// Drops the cached entry for one (user, site) pair.
    pub fn invalidate(&self, user_id: &str, site_id: &str) {
        self.cache.invalidate(&cache_key(user_id, site_id));
    }
}

fn cache_key(user_id: &str, site_id: &str) -> (String, String) {
    (record_key(user_id).to_owned(), record_key(site_id).to_owned())
}
