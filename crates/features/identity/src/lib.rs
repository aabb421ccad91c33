//! # Identity
//!
//! Users and their per-site roles. User records mirror an external identity
//! provider (Clerk): the provider pushes `user.*` events through a signed
//! webhook and this slice keeps a local copy the rest of the system can
//! reference from membership records.
//!
//! Role changes made here are picked up by the kernel's cached membership
//! resolver through explicit invalidation.

mod error;
pub mod models;
#[cfg(feature = "server")]
pub mod webhook;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod router;

pub use crate::error::{IdentityError, IdentityErrorExt};

#[cfg(feature = "server")]
use fhub_database::Database;
#[cfg(feature = "server")]
use fhub_domain::config::ApiConfig;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Identity feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Identity {
    pub users: repository::UserRepository,
    pub verifier: webhook::WebhookVerifier,
}

/// Initializes the identity slice. Fails fast when the configured webhook
/// signing secret cannot be decoded.
///
/// # Errors
/// [`IdentityError::Config`] for an unusable signing secret.
#[cfg(feature = "server")]
pub fn init(config: &ApiConfig, database: &Database) -> Result<InitializedSlice, IdentityError> {
    let inner = IdentityInner {
        users: repository::UserRepository::new(database.clone()),
        verifier: webhook::WebhookVerifier::new(&config.security.webhook)?,
    };
    let slice = Identity::new(inner);

    tracing::info!("Identity server slice initialized");
    Ok(InitializedSlice::new(slice))
}
