//! # Tenancy
//!
//! The multi-tenant backbone: every other slice scopes its records to a site
//! owned here. A site carries a unique slug, a set of routable hosts, a
//! subscription tier, and the free-form feature flag object the guards check
//! by dotted path.
//!
//! Host resolution is the hot path (the storefront resolves the `Host` header
//! on every request), so lookups go through an in-process cache that site
//! mutations invalidate.

mod error;
pub mod models;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod router;

pub use crate::error::{TenancyError, TenancyErrorExt};

#[cfg(feature = "server")]
use fhub_database::Database;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Tenancy feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Tenancy {
    pub sites: repository::SiteRepository,
}

/// Initializes the tenancy slice around a live database handle.
///
/// # Errors
/// Currently infallible; the signature leaves room for config-driven checks.
#[cfg(feature = "server")]
pub fn init(database: &Database) -> Result<InitializedSlice, TenancyError> {
    let inner = TenancyInner { sites: repository::SiteRepository::new(database.clone()) };
    let slice = Tenancy::new(inner);

    tracing::info!("Tenancy server slice initialized");
    Ok(InitializedSlice::new(slice))
}
