//! # Pages
//!
//! The page tree editor's backend: recursive section/container/block drafts,
//! publish snapshots, and a capped version history.
//!
//! Every draft replacement snapshots the outgoing draft before installing the
//! new one, so the history always covers what the editor just overwrote.
//! Publishing freezes the draft and SEO into a `published` snapshot that the
//! storefront serves; the draft keeps evolving independently until the next
//! publish.

mod error;
pub mod models;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod router;

pub use crate::error::{PagesError, PagesErrorExt};

#[cfg(feature = "server")]
use fhub_database::Database;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Pages feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Pages {
    pub pages: repository::PageRepository,
}

/// Initializes the pages slice around a live database handle.
///
/// # Errors
/// Currently infallible; the signature leaves room for config-driven checks.
#[cfg(feature = "server")]
pub fn init(database: &Database) -> Result<InitializedSlice, PagesError> {
    let inner = PagesInner { pages: repository::PageRepository::new(database.clone()) };
    let slice = Pages::new(inner);

    tracing::info!("Pages server slice initialized");
    Ok(InitializedSlice::new(slice))
}
