//! # Billing
//!
//! Payment-provider configuration for checkout integrations. Public fields
//! (publishable key, mode, currency) are stored plainly; the secret key is
//! sealed with ChaCha20-Poly1305 under a key derived from the configured
//! sealing key, and only its last four characters are ever read back.

mod error;
pub mod models;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub mod repository;
#[cfg(feature = "server")]
pub mod router;
#[cfg(feature = "server")]
pub mod sealing;

pub use crate::error::{BillingError, BillingErrorExt};

#[cfg(feature = "server")]
use fhub_database::Database;
#[cfg(feature = "server")]
use fhub_domain::config::ApiConfig;
#[cfg(feature = "server")]
use fhub_kernel::domain::registry::InitializedSlice;

/// Billing feature state.
#[cfg(feature = "server")]
#[fhub_derive::fhub_slice]
pub struct Billing {
    pub payments: repository::PaymentConfigRepository,
    pub sealer: sealing::SecretSealer,
}

/// Initializes the billing slice. Fails fast when the configured sealing key
/// cannot be turned into a cipher.
///
/// # Errors
/// [`BillingError::Config`] for an unusable sealing key.
#[cfg(feature = "server")]
pub fn init(config: &ApiConfig, database: &Database) -> Result<InitializedSlice, BillingError> {
    let inner = BillingInner {
        payments: repository::PaymentConfigRepository::new(database.clone()),
        sealer: sealing::SecretSealer::new(&config.security.sealing_key)?,
    };
    let slice = Billing::new(inner);

    tracing::info!("Billing server slice initialized");
    Ok(InitializedSlice::new(slice))
}
