//! SurrealDB-backed storage for posts, menus, and layouts.
//!
//! Menus and layouts are singletons per `(site, key)` and `(site, kind)`,
//! stored under composite record ids so upserts are natural and the unique
//! indexes only ever catch races.

use crate::error::{ContentError, ContentErrorExt};
use crate::models::{
    CreatePost, Layout, LayoutKind, Menu, MenuItem, Post, PostSummary, UpdatePost,
    UpsertLayout, UpsertMenu, validate_menu_key,
};
use fhub_database::surrealdb::sql::Datetime;
use fhub_database::{Database, RecordId, record_key};
use fhub_domain::blocks::{PageTree, Section, TreeLimits};
use fhub_domain::constants::{LAYOUT, MENU, POST, SITE};
use fhub_kernel::safe_nanoid;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PostRow {
    id: RecordId,
    site: RecordId,
    slug: String,
    title: String,
    markdown: String,
    tags: Vec<String>,
    cover_image: Option<String>,
    published: bool,
    published_at: Option<Datetime>,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id.to_string(),
            site_id: row.site.to_string(),
            slug: row.slug,
            title: row.title,
            markdown: row.markdown,
            tags: row.tags,
            cover_image: row.cover_image,
            published: row.published,
            published_at: row.published_at.map(Into::into),
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostSummaryRow {
    id: RecordId,
    slug: String,
    title: String,
    tags: Vec<String>,
    cover_image: Option<String>,
    published: bool,
    published_at: Option<Datetime>,
    updated_at: Datetime,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            id: row.id.to_string(),
            slug: row.slug,
            title: row.title,
            tags: row.tags,
            cover_image: row.cover_image,
            published: row.published,
            published_at: row.published_at.map(Into::into),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MenuRow {
    site: RecordId,
    key: String,
    items: Vec<MenuItem>,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<MenuRow> for Menu {
    fn from(row: MenuRow) -> Self {
        Self {
            site_id: row.site.to_string(),
            key: row.key,
            items: row.items,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LayoutRow {
    site: RecordId,
    kind: LayoutKind,
    sections: Vec<Section>,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<LayoutRow> for Layout {
    fn from(row: LayoutRow) -> Self {
        Self {
            site_id: row.site.to_string(),
            kind: row.kind,
            sections: row.sections,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

/// Post storage.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: Database,
}

impl PostRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an unpublished post.
    ///
    /// # Errors
    /// [`ContentError::Validation`] for malformed input, [`ContentError::Conflict`]
    /// when the slug is already used on this site.
    pub async fn create(&self, site_id: &str, req: CreatePost) -> Result<Post, ContentError> {
        req.validate()?;
        let site_key = record_key(site_id).to_owned();
        if self.slug_taken(&site_key, &req.slug, None).await? {
            return Err(slug_conflict(&req.slug));
        }

        let mut response = self
            .db
            .query(format!(
                "CREATE type::thing('{POST}', $id) SET site = type::thing('{SITE}', $site), \
                 slug = $slug, title = $title, markdown = $markdown, tags = $tags, \
                 cover_image = $cover, created_at = time::now(), updated_at = time::now()"
            ))
            .bind(("id", safe_nanoid!()))
            .bind(("site", site_key))
            .bind(("slug", req.slug))
            .bind(("title", req.title))
            .bind(("markdown", req.markdown))
            .bind(("tags", req.tags))
            .bind(("cover", req.cover_image))
            .await
            .context("Creating post")?;
        let rows: Vec<PostRow> = response.take(0).context("Decoding created post")?;

        rows.into_iter().next().map(Post::from).ok_or_else(|| ContentError::Internal {
            message: "Create returned no record".into(),
            context: None,
        })
    }

    /// Loads one post by record id.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if no such post exists.
    pub async fn get(&self, id: &str) -> Result<Post, ContentError> {
        let row: Option<PostRow> =
            self.db.select((POST, record_key(id))).await.context("Loading post")?;
        row.map(Post::from).ok_or_else(|| post_not_found(id))
    }

    /// Posts of a site, newest first, optionally narrowed to one tag.
    ///
    /// # Errors
    /// [`ContentError::Surreal`] on storage failure.
    pub async fn list(
        &self,
        site_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<PostSummary>, ContentError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT id, slug, title, tags, cover_image, published, published_at, \
                 updated_at FROM {POST} WHERE site = type::thing('{SITE}', $site) \
                 AND ($tag = NONE OR tags CONTAINS $tag) ORDER BY created_at DESC"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("tag", tag.map(ToOwned::to_owned)))
            .await
            .context("Listing posts")?;
        let rows: Vec<PostSummaryRow> = response.take(0).context("Decoding post list")?;
        Ok(rows.into_iter().map(PostSummary::from).collect())
    }

    /// Applies a partial update. An empty `cover_image` clears the cover.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if no such post exists, [`ContentError::Validation`]
    /// for malformed fields, [`ContentError::Conflict`] on slug collisions.
    pub async fn update(&self, id: &str, patch: UpdatePost) -> Result<Post, ContentError> {
        patch.validate()?;
        let before = self.get(id).await?;

        if let Some(slug) = &patch.slug {
            let site_key = record_key(&before.site_id).to_owned();
            if *slug != before.slug && self.slug_taken(&site_key, slug, Some(&before.id)).await? {
                return Err(slug_conflict(slug));
            }
        }

        let clear_cover = patch.cover_image.as_deref() == Some("");
        let cover = patch.cover_image.filter(|c| !c.is_empty());
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{POST}', $id) SET title = $title ?? title, \
                 slug = $slug ?? slug, markdown = $markdown ?? markdown, tags = $tags ?? tags, \
                 cover_image = IF $clear_cover {{ NONE }} ELSE {{ $cover ?? cover_image }}, \
                 updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .bind(("title", patch.title))
            .bind(("slug", patch.slug))
            .bind(("markdown", patch.markdown))
            .bind(("tags", patch.tags))
            .bind(("clear_cover", clear_cover))
            .bind(("cover", cover))
            .await
            .context("Updating post")?;
        let rows: Vec<PostRow> = response.take(0).context("Decoding updated post")?;
        rows.into_iter().next().map(Post::from).ok_or_else(|| post_not_found(id))
    }

    /// Marks the post published. The first publish date survives later
    /// publish cycles.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if no such post exists.
    pub async fn publish(&self, id: &str) -> Result<Post, ContentError> {
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{POST}', $id) SET published = true, \
                 published_at = published_at ?? time::now(), updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Publishing post")?;
        let rows: Vec<PostRow> = response.take(0).context("Decoding published post")?;
        rows.into_iter().next().map(Post::from).ok_or_else(|| post_not_found(id))
    }

    /// Hides the post. `published_at` is kept so a later publish keeps the
    /// original date.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if no such post exists.
    pub async fn unpublish(&self, id: &str) -> Result<Post, ContentError> {
        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{POST}', $id) SET published = false, \
                 updated_at = time::now()"
            ))
            .bind(("id", record_key(id).to_owned()))
            .await
            .context("Unpublishing post")?;
        let rows: Vec<PostRow> = response.take(0).context("Decoding unpublished post")?;
        rows.into_iter().next().map(Post::from).ok_or_else(|| post_not_found(id))
    }

    /// Deletes a post.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if no such post exists.
    pub async fn delete(&self, id: &str) -> Result<Post, ContentError> {
        let row: Option<PostRow> =
            self.db.delete((POST, record_key(id))).await.context("Deleting post")?;
        let post = row.map(Post::from).ok_or_else(|| post_not_found(id))?;
        debug!(post = %post.id, "Post deleted");
        Ok(post)
    }

    async fn slug_taken(
        &self,
        site_key: &str,
        slug: &str,
        exclude: Option<&str>,
    ) -> Result<bool, ContentError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT VALUE id FROM {POST} WHERE site = type::thing('{SITE}', $site) \
                 AND slug = $slug"
            ))
            .bind(("site", site_key.to_owned()))
            .bind(("slug", slug.to_owned()))
            .await
            .context("Checking slug")?;
        let ids: Vec<RecordId> = response.take(0).context("Decoding slug check")?;
        Ok(ids.into_iter().map(|id| id.to_string()).any(|id| exclude != Some(id.as_str())))
    }
}

/// Menu storage, keyed by `[site, key]`.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    db: Database,
}

impl MenuRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates or fully replaces the menu under `key`.
    ///
    /// # Errors
    /// [`ContentError::Validation`] for a malformed key or item tree.
    pub async fn upsert(
        &self,
        site_id: &str,
        key: &str,
        req: UpsertMenu,
    ) -> Result<Menu, ContentError> {
        validate_menu_key(key)?;
        req.validate()?;

        let mut response = self
            .db
            .query(format!(
                "UPSERT type::thing('{MENU}', [$site, $key]) SET \
                 site = type::thing('{SITE}', $site), key = $key, items = $items, \
                 created_at = created_at ?? time::now(), updated_at = time::now()"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("key", key.to_owned()))
            .bind(("items", req.items))
            .await
            .context("Upserting menu")?;
        let rows: Vec<MenuRow> = response.take(0).context("Decoding menu")?;
        rows.into_iter().next().map(Menu::from).ok_or_else(|| ContentError::Internal {
            message: "Upsert returned no record".into(),
            context: None,
        })
    }

    /// Loads the menu under `key`.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if the site has no such menu.
    pub async fn get(&self, site_id: &str, key: &str) -> Result<Menu, ContentError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM type::thing('{MENU}', [$site, $key])"))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("key", key.to_owned()))
            .await
            .context("Loading menu")?;
        let rows: Vec<MenuRow> = response.take(0).context("Decoding menu")?;
        rows.into_iter().next().map(Menu::from).ok_or_else(|| menu_not_found(key))
    }

    /// All menus of a site, ordered by key.
    ///
    /// # Errors
    /// [`ContentError::Surreal`] on storage failure.
    pub async fn list(&self, site_id: &str) -> Result<Vec<Menu>, ContentError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {MENU} WHERE site = type::thing('{SITE}', $site) ORDER BY key"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .await
            .context("Listing menus")?;
        let rows: Vec<MenuRow> = response.take(0).context("Decoding menu list")?;
        Ok(rows.into_iter().map(Menu::from).collect())
    }

    /// Deletes the menu under `key`.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if the site has no such menu.
    pub async fn delete(&self, site_id: &str, key: &str) -> Result<Menu, ContentError> {
        let mut response = self
            .db
            .query(format!("DELETE type::thing('{MENU}', [$site, $key]) RETURN BEFORE"))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("key", key.to_owned()))
            .await
            .context("Deleting menu")?;
        let rows: Vec<MenuRow> = response.take(0).context("Decoding deleted menu")?;
        rows.into_iter().next().map(Menu::from).ok_or_else(|| menu_not_found(key))
    }
}

/// Layout storage, keyed by `[site, kind]`.
#[derive(Debug, Clone)]
pub struct LayoutRepository {
    db: Database,
}

impl LayoutRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates or fully replaces the site's layout of `kind`.
    ///
    /// # Errors
    /// [`ContentError::Tree`] when the section tree violates structural
    /// limits.
    pub async fn upsert(
        &self,
        site_id: &str,
        kind: LayoutKind,
        req: UpsertLayout,
    ) -> Result<Layout, ContentError> {
        let tree = PageTree { sections: req.sections };
        tree.validate(&TreeLimits::default())?;

        let mut response = self
            .db
            .query(format!(
                "UPSERT type::thing('{LAYOUT}', [$site, $kind]) SET \
                 site = type::thing('{SITE}', $site), kind = $kind, sections = $sections, \
                 created_at = created_at ?? time::now(), updated_at = time::now()"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("kind", kind.as_str()))
            .bind(("sections", tree.sections))
            .await
            .context("Upserting layout")?;
        let rows: Vec<LayoutRow> = response.take(0).context("Decoding layout")?;
        rows.into_iter().next().map(Layout::from).ok_or_else(|| ContentError::Internal {
            message: "Upsert returned no record".into(),
            context: None,
        })
    }

    /// Loads the site's layout of `kind`.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if the site has no such layout.
    pub async fn get(&self, site_id: &str, kind: LayoutKind) -> Result<Layout, ContentError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM type::thing('{LAYOUT}', [$site, $kind])"))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("kind", kind.as_str()))
            .await
            .context("Loading layout")?;
        let rows: Vec<LayoutRow> = response.take(0).context("Decoding layout")?;
        rows.into_iter().next().map(Layout::from).ok_or_else(|| layout_not_found(kind))
    }

    /// Deletes the site's layout of `kind`.
    ///
    /// # Errors
    /// [`ContentError::NotFound`] if the site has no such layout.
    pub async fn delete(&self, site_id: &str, kind: LayoutKind) -> Result<Layout, ContentError> {
        let mut response = self
            .db
            .query(format!("DELETE type::thing('{LAYOUT}', [$site, $kind]) RETURN BEFORE"))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("kind", kind.as_str()))
            .await
            .context("Deleting layout")?;
        let rows: Vec<LayoutRow> = response.take(0).context("Decoding deleted layout")?;
        rows.into_iter().next().map(Layout::from).ok_or_else(|| layout_not_found(kind))
    }
}

fn post_not_found(id: &str) -> ContentError {
    ContentError::NotFound {
        message: format!("Post `{id}` does not exist").into(),
        context: None,
    }
}

fn menu_not_found(key: &str) -> ContentError {
    ContentError::NotFound {
        message: format!("Menu `{key}` does not exist for this site").into(),
        context: None,
    }
}

fn layout_not_found(kind: LayoutKind) -> ContentError {
    ContentError::NotFound {
        message: format!("No {kind} layout is set for this site").into(),
        context: None,
    }
}

fn slug_conflict(slug: &str) -> ContentError {
    ContentError::Conflict {
        message: format!("Slug `{slug}` is already in use on this site").into(),
        context: None,
    }
}
