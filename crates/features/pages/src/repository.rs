//! SurrealDB-backed storage for pages and their version history.
//!
//! Draft replacement goes through one transaction that snapshots the outgoing
//! draft, bumps the page's version counter, and prunes history beyond
//! [`MAX_VERSIONS`] entries, so a crash can never leave a draft without its
//! matching snapshot.

use crate::error::{PagesError, PagesErrorExt};
use crate::models::{
    CreatePage, Page, PageSummary, PageVersion, PublishedSnapshot, UpdatePage, VersionSummary,
    normalize_path, validate_path,
};
use fhub_database::surrealdb::sql::Datetime;
use fhub_database::{Database, RecordId, record_key};
use fhub_domain::blocks::{PageTree, Section, TreeLimits};
use fhub_domain::constants::{MAX_VERSIONS, PAGE, PAGE_VERSION, SITE};
use fhub_kernel::safe_nanoid;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PageRow {
    id: RecordId,
    site: RecordId,
    slug: String,
    path: String,
    title: String,
    seo: Value,
    draft: PageTree,
    published: Option<PublishedSnapshot>,
    published_at: Option<Datetime>,
    version_seq: i64,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id.to_string(),
            site_id: row.site.to_string(),
            slug: row.slug,
            path: row.path,
            title: row.title,
            seo: row.seo,
            draft: row.draft,
            published: row.published,
            published_at: row.published_at.map(Into::into),
            version_seq: row.version_seq,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryRow {
    id: RecordId,
    slug: String,
    path: String,
    title: String,
    published_at: Option<Datetime>,
    updated_at: Datetime,
}

impl From<SummaryRow> for PageSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id.to_string(),
            slug: row.slug,
            path: row.path,
            title: row.title,
            published_at: row.published_at.map(Into::into),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionRow {
    number: i64,
    tree: PageTree,
    seo: Value,
    created_at: Datetime,
}

impl From<VersionRow> for PageVersion {
    fn from(row: VersionRow) -> Self {
        Self {
            number: row.number,
            tree: row.tree,
            seo: row.seo,
            created_at: row.created_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionSummaryRow {
    number: i64,
    created_at: Datetime,
}

impl From<VersionSummaryRow> for VersionSummary {
    fn from(row: VersionSummaryRow) -> Self {
        Self { number: row.number, created_at: row.created_at.into() }
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

/// Page storage. Version records live in their own table keyed by
/// `[page, number]` so pruning and lookups never scan page rows.
#[derive(Debug, Clone)]
pub struct PageRepository {
    db: Database,
}

impl PageRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a page with an empty draft tree.
    ///
    /// # Errors
    /// [`PagesError::Validation`] for malformed input, [`PagesError::Conflict`]
    /// when the slug or path is already used on this site.
    pub async fn create(&self, site_id: &str, req: CreatePage) -> Result<Page, PagesError> {
        req.validate()?;
        let path = normalize_path(&req.path);
        validate_path(&path)?;

        let site_key = record_key(site_id).to_owned();
        if self.slug_taken(&site_key, &req.slug, None).await? {
            return Err(PagesError::Conflict {
                message: format!("Slug `{}` is already in use on this site", req.slug).into(),
                context: None,
            });
        }
        if self.path_taken(&site_key, &path, None).await? {
            return Err(PagesError::Conflict {
                message: format!("Path `{path}` is already in use on this site").into(),
                context: None,
            });
        }

        let mut response = self
            .db
            .query(format!(
                "CREATE type::thing('{PAGE}', $id) SET site = type::thing('{SITE}', $site), \
                 slug = $slug, path = $path, title = $title, seo = $seo, draft = $draft, \
                 created_at = time::now(), updated_at = time::now()"
            ))
            .bind(("id", safe_nanoid!()))
            .bind(("site", site_key))
            .bind(("slug", req.slug))
            .bind(("path", path))
            .bind(("title", req.title))
            .bind(("seo", req.seo))
            .bind(("draft", PageTree::default()))
            .await
            .context("Creating page")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding created page")?;

        rows.into_iter().next().map(Page::from).ok_or_else(|| PagesError::Internal {
            message: "Create returned no record".into(),
            context: None,
        })
    }

    /// Loads one page by record id.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists.
    pub async fn get(&self, id: &str) -> Result<Page, PagesError> {
        let row: Option<PageRow> =
            self.db.select((PAGE, record_key(id))).await.context("Loading page")?;
        row.map(Page::from).ok_or_else(|| not_found(id))
    }

    /// Pages of a site without the tree payloads, ordered by path.
    ///
    /// # Errors
    /// [`PagesError::Surreal`] on storage failure.
    pub async fn list(&self, site_id: &str) -> Result<Vec<PageSummary>, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT id, slug, path, title, published_at, updated_at FROM {PAGE} \
                 WHERE site = type::thing('{SITE}', $site) ORDER BY path"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .await
            .context("Listing pages")?;
        let rows: Vec<SummaryRow> = response.take(0).context("Decoding page list")?;
        Ok(rows.into_iter().map(PageSummary::from).collect())
    }

    /// Number of pages a site currently has.
    ///
    /// # Errors
    /// [`PagesError::Surreal`] on storage failure.
    pub async fn count_for_site(&self, site_id: &str) -> Result<usize, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT count() FROM {PAGE} WHERE site = type::thing('{SITE}', $site) GROUP ALL"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .await
            .context("Counting pages")?;
        let rows: Vec<CountRow> = response.take(0).context("Decoding page count")?;
        Ok(rows.first().map_or(0, |row| usize::try_from(row.count).unwrap_or(0)))
    }

    /// Applies a partial metadata update. The draft and published trees are
    /// untouched; content changes go through [`Self::save_content`].
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists, [`PagesError::Validation`]
    /// for malformed fields, [`PagesError::Conflict`] on slug or path collisions.
    pub async fn update(&self, id: &str, patch: UpdatePage) -> Result<Page, PagesError> {
        patch.validate()?;
        let before = self.get(id).await?;

        let path = patch.path.as_deref().map(normalize_path);
        if let Some(path) = &path {
            validate_path(path)?;
        }

        let site_key = record_key(&before.site_id).to_owned();
        if let Some(slug) = &patch.slug {
            if *slug != before.slug && self.slug_taken(&site_key, slug, Some(&before.id)).await? {
                return Err(PagesError::Conflict {
                    message: format!("Slug `{slug}` is already in use on this site").into(),
                    context: None,
                });
            }
        }
        if let Some(path) = &path {
            if *path != before.path && self.path_taken(&site_key, path, Some(&before.id)).await? {
                return Err(PagesError::Conflict {
                    message: format!("Path `{path}` is already in use on this site").into(),
                    context: None,
                });
            }
        }

        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{PAGE}', $id) SET title = $title ?? title, \
                 slug = $slug ?? slug, path = $path ?? path, seo = $seo ?? seo, \
                 updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("title", patch.title))
            .bind(("slug", patch.slug))
            .bind(("path", path))
            .bind(("seo", patch.seo))
            .await
            .context("Updating page")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding updated page")?;
        rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))
    }

    /// Deletes a page together with its version history.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists.
    pub async fn delete(&self, id: &str) -> Result<Page, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 DELETE {PAGE_VERSION} WHERE page = type::thing('{PAGE}', $id); \
                 DELETE type::thing('{PAGE}', $id) RETURN BEFORE; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Deleting page")?;
        let rows: Vec<PageRow> = response.take(1).context("Decoding deleted page")?;
        let page = rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))?;
        debug!(page = %page.id, "Page deleted");
        Ok(page)
    }

    /// Replaces the draft tree, snapshotting the outgoing draft as a version.
    ///
    /// # Errors
    /// [`PagesError::Tree`] if the tree violates structural limits,
    /// [`PagesError::NotFound`] if no such page exists.
    pub async fn save_content(&self, id: &str, tree: PageTree) -> Result<Page, PagesError> {
        tree.validate(&TreeLimits::default())?;
        self.get(id).await?;
        self.snapshot_and_replace(id, tree, None).await
    }

    /// Reorders the draft's sections. `order` must be a permutation of the
    /// current section ids. Block content is untouched and no version is
    /// snapshotted; a reorder is a layout tweak, not a content replacement.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists, [`PagesError::Validation`]
    /// if `order` is not a permutation of the current section ids.
    pub async fn reorder_sections(&self, id: &str, order: &[String]) -> Result<Page, PagesError> {
        let page = self.get(id).await?;
        let mut by_id: HashMap<String, Section> =
            page.draft.sections.into_iter().map(|s| (s.id.clone(), s)).collect();
        if by_id.len() != order.len() {
            return Err(PagesError::Validation {
                message: "Section order must list every current section exactly once".into(),
                context: None,
            });
        }

        let mut sections = Vec::with_capacity(order.len());
        for section_id in order {
            let Some(section) = by_id.remove(section_id) else {
                return Err(PagesError::Validation {
                    message: format!("Unknown or duplicate section id `{section_id}`").into(),
                    context: None,
                });
            };
            sections.push(section);
        }

        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{PAGE}', $id) SET draft = $tree, updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("tree", PageTree { sections }))
            .await
            .context("Reordering sections")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding reordered page")?;
        rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))
    }

    /// Version history of a page, newest first. Tree payloads are omitted.
    ///
    /// # Errors
    /// [`PagesError::Surreal`] on storage failure.
    pub async fn list_versions(&self, id: &str) -> Result<Vec<VersionSummary>, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT number, created_at FROM {PAGE_VERSION} \
                 WHERE page = type::thing('{PAGE}', $id) ORDER BY number DESC"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Listing versions")?;
        let rows: Vec<VersionSummaryRow> = response.take(0).context("Decoding version list")?;
        Ok(rows.into_iter().map(VersionSummary::from).collect())
    }

    /// Loads one snapshot by its number.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if the page has no version with this number.
    pub async fn get_version(&self, id: &str, number: i64) -> Result<PageVersion, PagesError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM type::thing('{PAGE_VERSION}', [$id, $number])"))
            .bind(("id", record_key(id).to_owned()))
            .bind(("number", number))
            .await
            .context("Loading version")?;
        let rows: Vec<VersionRow> = response.take(0).context("Decoding version")?;
        rows.into_iter().next().map(PageVersion::from).ok_or_else(|| PagesError::NotFound {
            message: format!("Version {number} does not exist for this page").into(),
            context: None,
        })
    }

    /// Restores a snapshot into the draft. The draft being replaced is
    /// snapshotted first, so a restore can itself be undone.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if the page or version does not exist.
    pub async fn restore_version(&self, id: &str, number: i64) -> Result<Page, PagesError> {
        self.get(id).await?;
        let version = self.get_version(id, number).await?;
        self.snapshot_and_replace(id, version.tree, Some(version.seo)).await
    }

    /// Freezes the current draft and SEO as the live snapshot.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists.
    pub async fn publish(&self, id: &str) -> Result<Page, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{PAGE}', $id) SET published = {{ tree: draft, seo: seo }}, \
                 published_at = time::now(), updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Publishing page")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding published page")?;
        let page = rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))?;
        debug!(page = %page.id, "Page published");
        Ok(page)
    }

    /// Takes the page off the storefront. The draft is untouched.
    ///
    /// # Errors
    /// [`PagesError::NotFound`] if no such page exists.
    pub async fn unpublish(&self, id: &str) -> Result<Page, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{PAGE}', $id) SET published = NONE, \
                 published_at = NONE, updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Unpublishing page")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding unpublished page")?;
        let page = rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))?;
        debug!(page = %page.id, "Page unpublished");
        Ok(page)
    }

    /// Storefront lookup: the page at `path` with a live snapshot, if any.
    ///
    /// # Errors
    /// [`PagesError::Surreal`] on storage failure.
    pub async fn find_published(
        &self,
        site_id: &str,
        path: &str,
    ) -> Result<Option<Page>, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {PAGE} WHERE site = type::thing('{SITE}', $site) \
                 AND path = $path AND published != NONE LIMIT 1"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("path", normalize_path(path)))
            .await
            .context("Resolving published page")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding published lookup")?;
        Ok(rows.into_iter().next().map(Page::from))
    }

    /// Preview lookup: the page at `path` regardless of publish state.
    ///
    /// # Errors
    /// [`PagesError::Surreal`] on storage failure.
    pub async fn find_by_path(
        &self,
        site_id: &str,
        path: &str,
    ) -> Result<Option<Page>, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {PAGE} WHERE site = type::thing('{SITE}', $site) \
                 AND path = $path LIMIT 1"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("path", normalize_path(path)))
            .await
            .context("Resolving page by path")?;
        let rows: Vec<PageRow> = response.take(0).context("Decoding path lookup")?;
        Ok(rows.into_iter().next().map(Page::from))
    }

    /// One transaction: snapshot the outgoing draft as the next version,
    /// install the new draft, prune history beyond [`MAX_VERSIONS`] entries.
    ///
    /// Concurrent saves race on the `(page, number)` unique index; the loser's
    /// transaction is cancelled and surfaces as a storage error.
    async fn snapshot_and_replace(
        &self,
        id: &str,
        tree: PageTree,
        seo: Option<Value>,
    ) -> Result<Page, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $page = (SELECT * FROM ONLY type::thing('{PAGE}', $id)); \
                 LET $number = $page.version_seq + 1; \
                 CREATE type::thing('{PAGE_VERSION}', [$id, $number]) SET \
                 page = type::thing('{PAGE}', $id), number = $number, tree = $page.draft, \
                 seo = $page.seo, created_at = time::now(); \
                 UPDATE type::thing('{PAGE}', $id) SET draft = $tree, seo = $seo ?? seo, \
                 version_seq = $number, updated_at = time::now(); \
                 DELETE {PAGE_VERSION} WHERE page = type::thing('{PAGE}', $id) \
                 AND number <= $number - {MAX_VERSIONS}; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("tree", tree))
            .bind(("seo", seo))
            .await
            .context("Saving draft")?;
        let rows: Vec<PageRow> = response.take(3).context("Decoding saved page")?;
        let page = rows.into_iter().next().map(Page::from).ok_or_else(|| not_found(id))?;
        debug!(page = %page.id, version = page.version_seq, "Draft replaced");
        Ok(page)
    }

    async fn slug_taken(
        &self,
        site_key: &str,
        slug: &str,
        exclude: Option<&str>,
    ) -> Result<bool, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT VALUE id FROM {PAGE} WHERE site = type::thing('{SITE}', $site) \
                 AND slug = $slug"
            ))
            .bind(("site", site_key.to_owned()))
            .bind(("slug", slug.to_owned()))
            .await
            .context("Checking slug")?;
        let ids: Vec<RecordId> = response.take(0).context("Decoding slug check")?;
        Ok(ids.into_iter().map(|id| id.to_string()).any(|id| exclude != Some(id.as_str())))
    }

    async fn path_taken(
        &self,
        site_key: &str,
        path: &str,
        exclude: Option<&str>,
    ) -> Result<bool, PagesError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT VALUE id FROM {PAGE} WHERE site = type::thing('{SITE}', $site) \
                 AND path = $path"
            ))
            .bind(("site", site_key.to_owned()))
            .bind(("path", path.to_owned()))
            .await
            .context("Checking path")?;
        let ids: Vec<RecordId> = response.take(0).context("Decoding path check")?;
        Ok(ids.into_iter().map(|id| id.to_string()).any(|id| exclude != Some(id.as_str())))
    }
}

fn not_found(id: &str) -> PagesError {
    PagesError::NotFound {
        message: format!("Page `{id}` does not exist").into(),
        context: None,
    }
}
