//! # Content
//!
//! Supporting content around the page tree: markdown posts, navigation menus,
//! and the header/footer layouts that frame every rendered page.
//!
//! Menus and layouts are singletons addressed by `(site, key)` and
//! `(site, kind)`; posts are ordinary records with a per-site slug. None of it
//! participates in page versioning. Mutations here invalidate the whole site
//! on the storefront because menus and layouts show up on every path.

mod error;
pub mod models;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod router;

pub use crate::error::{ContentError, ContentErrorExt};

#[cfg(feature = "server")]
use fhub_database::Database;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Content feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Content {
    pub posts: repository::PostRepository,
    pub menus: repository::MenuRepository,
    pub layouts: repository::LayoutRepository,
}

/// Initializes the content slice around a live database handle.
///
/// # Errors
/// Currently infallible; the signature leaves room for config-driven checks.
#[cfg(feature = "server")]
pub fn init(database: &Database) -> Result<InitializedSlice, ContentError> {
    let inner = ContentInner {
        posts: repository::PostRepository::new(database.clone()),
        menus: repository::MenuRepository::new(database.clone()),
        layouts: repository::LayoutRepository::new(database.clone()),
    };
    let slice = Content::new(inner);

    tracing::info!("Content server slice initialized");
    Ok(InitializedSlice::new(slice))
}
