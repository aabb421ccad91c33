//! # Publishing
//!
//! Keeps rendered storefronts in sync with the editor. Content slices queue
//! [`ContentChanged`](fhub_domain::events::ContentChanged) events; a single
//! worker drains the queue and pushes the changed paths to every configured
//! storefront, which drops the matching cache entries. Admins can queue the
//! same event by hand when a cache needs flushing.

mod error;
pub mod models;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod router;
#[cfg(feature = "server")]
pub mod worker;

pub use crate::error::{PublishingError, PublishingErrorExt};

#[cfg(feature = "server")]
use fhub_domain::config::ApiConfig;
#[cfg(feature = "server")]
use fhub_event_bus::EventBus;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Publishing feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Publishing {
    pub revalidator: worker::RevalidationWorker,
}

/// Initializes the publishing slice and spawns the revalidation worker.
///
/// # Errors
/// [`PublishingError::Bus`] when the content-changed queue is already
/// claimed, [`PublishingError::Http`] when the outbound client cannot be
/// built.
#[cfg(feature = "server")]
pub fn init(config: &ApiConfig, events: &EventBus) -> Result<InitializedSlice, PublishingError> {
    let inner = PublishingInner {
        revalidator: worker::RevalidationWorker::spawn(&config.revalidation, events)?,
    };
    let slice = Publishing::new(inner);

    tracing::info!("Publishing server slice initialized");
    Ok(InitializedSlice::new(slice))
}
