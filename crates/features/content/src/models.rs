//! Wire models for posts, menus, and header/footer layouts.

use crate::error::ContentError;
use chrono::{DateTime, Utc};
use fhub_derive::api_model;
use fhub_domain::blocks::Section;

pub(crate) const MAX_TITLE_LEN: usize = 200;
pub(crate) const MAX_SLUG_LEN: usize = 64;
pub(crate) const MAX_MARKDOWN_LEN: usize = 200_000;
pub(crate) const MAX_TAGS: usize = 16;
pub(crate) const MAX_TAG_LEN: usize = 40;
pub(crate) const MAX_MENU_DEPTH: usize = 5;
pub(crate) const MAX_MENU_NODES: usize = 200;
pub(crate) const MAX_LABEL_LEN: usize = 80;
pub(crate) const MAX_HREF_LEN: usize = 512;

/// A blog-style post. Markdown stays source; rendering happens at display
/// time.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub site_id: String,
    pub slug: String,
    pub title: String,
    pub markdown: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing shape without the body.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct PostSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a post. Posts start unpublished.
#[api_model]
#[derive(Clone)]
pub struct CreatePost {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Partial update. Absent fields are left unchanged; an empty string clears
/// the cover image.
#[api_model]
#[derive(Clone, Default)]
pub struct UpdatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// One entry of a navigation menu. Children nest up to [`MAX_MENU_DEPTH`]
/// levels.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[cfg_attr(feature = "server", schema(no_recursion))]
    pub children: Vec<MenuItem>,
}

/// A named navigation menu (`main`, `footer`, ...). Addressed by its
/// site and key, so no record id is exposed.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Menu {
    pub site_id: String,
    pub key: String,
    pub items: Vec<MenuItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement payload for a menu; the key comes from the route.
#[api_model]
#[derive(Clone)]
pub struct UpsertMenu {
    pub items: Vec<MenuItem>,
}

/// Where a layout renders relative to the page body.
#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Header,
    Footer,
}

/// A header or footer built from the same section tree pages use.
/// Addressed by its site and kind.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Layout {
    pub site_id: String,
    pub kind: LayoutKind,
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement payload for a layout; the kind comes from the route.
#[api_model]
#[derive(Clone)]
pub struct UpsertLayout {
    pub sections: Vec<Section>,
}

impl LayoutKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
        }
    }

    /// # Errors
    /// Returns [`ContentError::Validation`] for anything but `header` or
    /// `footer`.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        match value {
            "header" => Ok(Self::Header),
            "footer" => Ok(Self::Footer),
            other => Err(ContentError::Validation {
                message: format!("Unknown layout kind `{other}`; expected header or footer")
                    .into(),
                context: None,
            }),
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CreatePost {
    /// # Errors
    /// Returns [`ContentError::Validation`] for malformed fields.
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_title(&self.title)?;
        validate_slug(&self.slug)?;
        validate_markdown(&self.markdown)?;
        validate_tags(&self.tags)?;
        if let Some(cover) = &self.cover_image {
            if cover.is_empty() {
                return Err(validation("Cover image must not be empty; omit it instead"));
            }
            validate_cover(cover)?;
        }
        Ok(())
    }
}

impl UpdatePost {
    /// # Errors
    /// Returns [`ContentError::Validation`] for malformed fields.
    pub fn validate(&self) -> Result<(), ContentError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(markdown) = &self.markdown {
            validate_markdown(markdown)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        if let Some(cover) = &self.cover_image {
            // Empty is the clear sentinel, so only the cap applies.
            validate_cover(cover)?;
        }
        Ok(())
    }
}

impl UpsertMenu {
    /// # Errors
    /// Returns [`ContentError::Validation`] when the item tree is malformed.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut nodes = 0usize;
        validate_menu_level(&self.items, 1, &mut nodes)
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), ContentError> {
    if title.trim().is_empty() {
        return Err(validation("Title must not be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(validation("Title is too long"));
    }
    Ok(())
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), ContentError> {
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

/// Menu keys share the slug shape: `main`, `footer-legal`, ...
pub(crate) fn validate_menu_key(key: &str) -> Result<(), ContentError> {
    validate_slug(key).map_err(|_| validation("Menu key must be 1-64 slug characters"))
}

fn validate_markdown(markdown: &str) -> Result<(), ContentError> {
    if markdown.len() > MAX_MARKDOWN_LEN {
        return Err(validation("Markdown body is too long"));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ContentError> {
    if tags.len() > MAX_TAGS {
        return Err(validation("Too many tags"));
    }
    if tags.iter().any(|tag| tag.trim().is_empty() || tag.len() > MAX_TAG_LEN) {
        return Err(validation("Tags must be 1-40 characters"));
    }
    Ok(())
}

fn validate_cover(cover: &str) -> Result<(), ContentError> {
    if cover.len() > MAX_HREF_LEN {
        return Err(validation("Cover image URL is too long"));
    }
    Ok(())
}

fn validate_menu_level(
    items: &[MenuItem],
    depth: usize,
    nodes: &mut usize,
) -> Result<(), ContentError> {
    if depth > MAX_MENU_DEPTH {
        return Err(validation("Menu nests too deep"));
    }
    for item in items {
        *nodes += 1;
        if *nodes > MAX_MENU_NODES {
            return Err(validation("Menu has too many entries"));
        }
        if item.label.trim().is_empty() || item.label.len() > MAX_LABEL_LEN {
            return Err(validation("Menu labels must be 1-80 characters"));
        }
        if item.href.is_empty() || item.href.len() > MAX_HREF_LEN {
            return Err(validation("Menu hrefs must be 1-512 characters"));
        }
        validate_menu_level(&item.children, depth + 1, nodes)?;
    }
    Ok(())
}

fn validation(message: &'static str) -> ContentError {
    ContentError::Validation { message: message.into(), context: None }
}
