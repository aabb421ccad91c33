//! Wire models for pages, published snapshots, and version history.

use crate::error::PagesError;
use chrono::{DateTime, Utc};
use fhub_derive::api_model;
use fhub_domain::blocks::PageTree;
use serde_json::Value;

pub(crate) const MAX_TITLE_LEN: usize = 200;
pub(crate) const MAX_SLUG_LEN: usize = 64;
pub(crate) const MAX_PATH_LEN: usize = 256;

/// A page as served by the API: routing metadata, the editable draft tree,
/// and the published snapshot when one exists.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub site_id: String,
    pub slug: String,
    pub path: String,
    pub title: String,
    pub seo: Value,
    pub draft: PageTree,
    pub published: Option<PublishedSnapshot>,
    pub published_at: Option<DateTime<Utc>>,
    pub version_seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `publish` froze: the tree and SEO exactly as they were at that time.
/// Routing fields (path, title) stay live on the page itself.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct PublishedSnapshot {
    pub tree: PageTree,
    pub seo: Value,
}

/// What the storefront renders: one tree with its SEO, no editing state.
///
/// Built from either the live snapshot or the draft; callers never see which
/// fields a full [`Page`] would carry.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct RenderablePage {
    pub id: String,
    pub site_id: String,
    pub slug: String,
    pub path: String,
    pub title: String,
    pub tree: PageTree,
    pub seo: Value,
}

/// A short-lived grant for viewing one page's draft on the storefront.
#[api_model]
#[derive(Clone)]
pub struct PreviewLink {
    pub token: String,
    pub path: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Listing shape without the heavy tree payloads.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct PageSummary {
    pub id: String,
    pub slug: String,
    pub path: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a page. The draft starts empty.
#[api_model]
#[derive(Clone)]
pub struct CreatePage {
    pub title: String,
    pub slug: String,
    pub path: String,
    #[serde(default = "empty_object")]
    pub seo: Value,
}

/// Partial metadata update. Absent fields are left unchanged.
#[api_model]
#[derive(Clone, Default)]
pub struct UpdatePage {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub seo: Option<Value>,
}

/// Desired section order for a page draft: a permutation of the current
/// section ids.
#[api_model]
#[derive(Clone)]
pub struct ReorderSections {
    pub section_ids: Vec<String>,
}

/// A stored content snapshot, addressed by its monotonic number.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct PageVersion {
    pub number: i64,
    pub tree: PageTree,
    pub seo: Value,
    pub created_at: DateTime<Utc>,
}

/// Version listing shape without the tree payload.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct VersionSummary {
    pub number: i64,
    pub created_at: DateTime<Utc>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Page {
    /// Storefront projection of the live snapshot. `None` for unpublished
    /// pages. Title and path come from the page itself, so renames show up
    /// without republishing.
    #[must_use]
    pub fn published_view(self) -> Option<RenderablePage> {
        let snapshot = self.published?;
        Some(RenderablePage {
            id: self.id,
            site_id: self.site_id,
            slug: self.slug,
            path: self.path,
            title: self.title,
            tree: snapshot.tree,
            seo: snapshot.seo,
        })
    }

    /// Preview projection of the current draft.
    #[must_use]
    pub fn draft_view(self) -> RenderablePage {
        RenderablePage {
            id: self.id,
            site_id: self.site_id,
            slug: self.slug,
            path: self.path,
            title: self.title,
            tree: self.draft,
            seo: self.seo,
        }
    }
}

impl CreatePage {
    /// Checks everything except the path, which the repository normalizes
    /// before validating.
    ///
    /// # Errors
    /// Returns [`PagesError::Validation`] for malformed fields.
    pub fn validate(&self) -> Result<(), PagesError> {
        validate_title(&self.title)?;
        validate_slug(&self.slug)?;
        validate_seo(&self.seo)
    }
}

impl UpdatePage {
    /// # Errors
    /// Returns [`PagesError::Validation`] for malformed fields.
    pub fn validate(&self) -> Result<(), PagesError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(seo) = &self.seo {
            validate_seo(seo)?;
        }
        Ok(())
    }
}

/// Canonical storefront path: leading slash, no empty segments, no trailing
/// slash except for the root itself.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), PagesError> {
    if title.trim().is_empty() {
        return Err(validation("Title must not be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(validation("Title is too long"));
    }
    Ok(())
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), PagesError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(validation("Slug must be 1-64 characters"));
    }
    let valid_shape = slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !valid_shape {
        return Err(validation(
            "Slug must be lowercase letters, digits, and inner hyphens",
        ));
    }
    Ok(())
}

/// Validates an already-normalized path.
pub(crate) fn validate_path(path: &str) -> Result<(), PagesError> {
    if path.len() > MAX_PATH_LEN {
        return Err(validation("Path is too long"));
    }
    if path == "/" {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(validation("Path must start with `/`"));
    };
    let segments_ok = rest.split('/').all(|segment| {
        !segment.is_empty()
            && segment.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    });
    if !segments_ok {
        return Err(validation(
            "Path segments must be lowercase letters, digits, and hyphens",
        ));
    }
    Ok(())
}

pub(crate) fn validate_seo(seo: &Value) -> Result<(), PagesError> {
    if seo.is_object() {
        Ok(())
    } else {
        Err(validation("SEO must be a JSON object"))
    }
}

fn validation(message: &'static str) -> PagesError {
    PagesError::Validation { message: message.into(), context: None }
}
