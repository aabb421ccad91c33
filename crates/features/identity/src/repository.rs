//! SurrealDB-backed storage for mirrored users and per-site memberships.
//!
//! Record keys equal external ids: webhook mirrors use the provider's user id
//! as the key, manual creates default `external_id` to the generated key. Both
//! `user:user_2abc` and the bare `user_2abc` therefore address the same row.

use crate::error::{IdentityError, IdentityErrorExt};
use crate::models::{CreateUser, Member, UpdateUser, User};
use crate::webhook::MirroredUser;
use fhub_database::surrealdb::sql::Datetime;
use fhub_database::{Database, RecordId, record_key};
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{MEMBERSHIP, SITE, USER};
use fhub_kernel::safe_nanoid;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UserRow {
    id: RecordId,
    external_id: String,
    email: String,
    name: Option<String>,
    avatar_url: Option<String>,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.to_string(),
            external_id: row.external_id,
            email: row.email,
            name: row.name,
            avatar_url: row.avatar_url,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    role: String,
    user: UserRow,
}

/// Minimal view of a membership row, for deletes that report affected sites.
#[derive(Debug, Deserialize)]
struct MembershipRow {
    site: RecordId,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self { user: row.user.into(), role: Role::from(row.role.as_str()) }
    }
}

/// User and membership storage.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a user. The record key is the external id when one is given,
    /// otherwise a generated key doubling as the external id.
    ///
    /// # Errors
    /// [`IdentityError::Validation`] for a malformed email,
    /// [`IdentityError::Conflict`] when the external id is already mirrored.
    pub async fn create(&self, req: CreateUser) -> Result<User, IdentityError> {
        req.validate()?;
        let key = req.external_id.unwrap_or_else(|| safe_nanoid!());
        if self.find_by_external(&key).await?.is_some() {
            return Err(IdentityError::Conflict {
                message: format!("User `{key}` already exists").into(),
                context: None,
            });
        }

        let mut response = self
            .db
            .query(format!(
                "CREATE type::thing('{USER}', $id) SET external_id = $id, \
                 email = $email, name = $name, avatar_url = $avatar, \
                 created_at = time::now(), updated_at = time::now()"
            ))
            .bind(("id", key))
            .bind(("email", req.email))
            .bind(("name", req.name))
            .bind(("avatar", req.avatar_url))
            .await
            .context("Creating user")?;
        let rows: Vec<UserRow> = response.take(0).context("Decoding created user")?;

        rows.into_iter().next().map(User::from).ok_or_else(|| IdentityError::Internal {
            message: "Create returned no record".into(),
            context: None,
        })
    }

    /// Loads one user by record id or bare key.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] if no such user exists.
    pub async fn get(&self, id: &str) -> Result<User, IdentityError> {
        let row: Option<UserRow> =
            self.db.select((USER, record_key(id))).await.context("Loading user")?;
        row.map(User::from).ok_or_else(|| not_found(id))
    }

    /// Looks a user up by the unique `external_id` field.
    ///
    /// # Errors
    /// [`IdentityError::Surreal`] on storage failure.
    pub async fn find_by_external(&self, external_id: &str) -> Result<Option<User>, IdentityError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {USER} WHERE external_id = $ext LIMIT 1"))
            .bind(("ext", external_id.to_owned()))
            .await
            .context("Resolving external id")?;
        let rows: Vec<UserRow> = response.take(0).context("Decoding external lookup")?;
        Ok(rows.into_iter().next().map(User::from))
    }

    /// Applies a partial update; absent fields keep their current value.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] if no such user exists,
    /// [`IdentityError::Validation`] for a malformed email.
    pub async fn update(&self, id: &str, patch: UpdateUser) -> Result<User, IdentityError> {
        patch.validate()?;
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{USER}', $id) SET email = $email ?? email, \
                 name = $name ?? name, avatar_url = $avatar ?? avatar_url, \
                 updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("email", patch.email))
            .bind(("name", patch.name))
            .bind(("avatar", patch.avatar_url))
            .await
            .context("Updating user")?;
        let rows: Vec<UserRow> = response.take(0).context("Decoding updated user")?;
        rows.into_iter().next().map(User::from).ok_or_else(|| not_found(id))
    }

    /// Deletes a user and all memberships pointing at it, in one transaction.
    /// Returns the removed user and the site ids whose member lists changed,
    /// so callers can drop cached role lookups.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] if no such user exists.
    pub async fn delete(&self, id: &str) -> Result<(User, Vec<String>), IdentityError> {
        self.remove_user(record_key(id)).await?.ok_or_else(|| not_found(id))
    }

    /// Mirrors a `user.created` / `user.updated` webhook payload. Unlike
    /// [`update`](Self::update), absent optional fields clear the stored
    /// value so the mirror tracks the provider exactly.
    ///
    /// # Errors
    /// [`IdentityError::Surreal`] on storage failure.
    pub async fn upsert_external(&self, profile: MirroredUser) -> Result<User, IdentityError> {
        let mut response = self
            .db
            .query(format!(
                "UPSERT type::thing('{USER}', $ext) SET external_id = $ext, \
                 email = $email, name = $name, avatar_url = $avatar, \
                 created_at = created_at ?? time::now(), updated_at = time::now()"
            ))
            .bind(("ext", profile.external_id))
            .bind(("email", profile.email))
            .bind(("name", profile.name))
            .bind(("avatar", profile.avatar_url))
            .await
            .context("Mirroring user")?;
        let rows: Vec<UserRow> = response.take(0).context("Decoding mirrored user")?;

        rows.into_iter().next().map(User::from).ok_or_else(|| IdentityError::Internal {
            message: "Upsert returned no record".into(),
            context: None,
        })
    }

    /// Handles a `user.deleted` webhook. Returns the removed user and the
    /// affected site ids, or `None` when the mirror never had it; retried
    /// deliveries stay idempotent.
    ///
    /// # Errors
    /// [`IdentityError::Surreal`] on storage failure.
    pub async fn delete_external(
        &self,
        external_id: &str,
    ) -> Result<Option<(User, Vec<String>)>, IdentityError> {
        self.remove_user(external_id).await
    }

    /// Grants or changes a role. The membership id is derived from the pair,
    /// so repeated grants update in place.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] when the user does not exist.
    pub async fn upsert_membership(
        &self,
        site_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<Member, IdentityError> {
        let user = self.get(user_id).await?;
        self.db
            .query(format!(
                "UPSERT type::thing('{MEMBERSHIP}', [$site, $user]) SET \
                 site = type::thing('{SITE}', $site), user = type::thing('{USER}', $user), \
                 role = $role, created_at = created_at ?? time::now(), \
                 updated_at = time::now()"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("user", record_key(user_id).to_owned()))
            .bind(("role", role.as_str()))
            .await
            .context("Assigning role")?
            .check()
            .context("Assigning role")?;
        debug!(
            site = record_key(site_id),
            user = record_key(user_id),
            role = role.as_str(),
            "Role assigned"
        );
        Ok(Member { user, role })
    }

    /// Revokes a user's membership on a site.
    ///
    /// # Errors
    /// [`IdentityError::NotFound`] when no membership exists for the pair.
    pub async fn remove_membership(
        &self,
        site_id: &str,
        user_id: &str,
    ) -> Result<(), IdentityError> {
        let mut response = self
            .db
            .query(format!(
                "DELETE type::thing('{MEMBERSHIP}', [$site, $user]) RETURN BEFORE"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("user", record_key(user_id).to_owned()))
            .await
            .context("Revoking role")?;
        let removed: Vec<MembershipRow> = response.take(0).context("Decoding revocation")?;
        if removed.is_empty() {
            return Err(IdentityError::NotFound {
                message: format!("`{user_id}` is not a member of `{site_id}`").into(),
                context: None,
            });
        }
        Ok(())
    }

    /// The target user's current role on a site, uncached. Used when a
    /// mutation's permission depends on the target's standing.
    ///
    /// # Errors
    /// [`IdentityError::Surreal`] on storage failure.
    pub async fn membership_role(
        &self,
        site_id: &str,
        user_id: &str,
    ) -> Result<Option<Role>, IdentityError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT VALUE role FROM {MEMBERSHIP} WHERE site = $site AND user = $user LIMIT 1"
            ))
            .bind(("site", RecordId::from_table_key(SITE, record_key(site_id))))
            .bind(("user", RecordId::from_table_key(USER, record_key(user_id))))
            .await
            .context("Loading membership")?;
        let roles: Vec<String> = response.take(0).context("Decoding membership")?;
        Ok(roles.first().map(|role| Role::from(role.as_str())))
    }

    /// All members of a site, owners first.
    ///
    /// # Errors
    /// [`IdentityError::Surreal`] on storage failure.
    pub async fn list_members(&self, site_id: &str) -> Result<Vec<Member>, IdentityError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT role, user FROM {MEMBERSHIP} WHERE site = $site FETCH user"
            ))
            .bind(("site", RecordId::from_table_key(SITE, record_key(site_id))))
            .await
            .context("Listing members")?;
        let rows: Vec<MemberRow> = response.take(0).context("Decoding member list")?;

        let mut members: Vec<Member> = rows.into_iter().map(Member::from).collect();
        members.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.user.id.cmp(&b.user.id)));
        Ok(members)
    }

    /// Shared delete path: memberships first, then the user row.
    async fn remove_user(&self, key: &str) -> Result<Option<(User, Vec<String>)>, IdentityError> {
        let mut response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 DELETE {MEMBERSHIP} WHERE user = type::thing('{USER}', $id) RETURN BEFORE; \
                 DELETE type::thing('{USER}', $id) RETURN BEFORE; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", key.to_owned()))
            .await
            .context("Deleting user")?;
        let memberships: Vec<MembershipRow> =
            response.take(0).context("Decoding removed memberships")?;
        let rows: Vec<UserRow> = response.take(1).context("Decoding deleted user")?;

        let sites = memberships.into_iter().map(|row| row.site.to_string()).collect();
        Ok(rows.into_iter().next().map(|row| (User::from(row), sites)))
    }
}

fn not_found(id: &str) -> IdentityError {
    IdentityError::NotFound {
        message: format!("User `{id}` does not exist").into(),
        context: None,
    }
}
