//! API models for payment-provider configuration.
//!
//! The secret key only ever appears in the upsert payload. Stored configs are
//! read back in a masked form carrying the last four characters of the secret
//! so a dashboard can show which key is installed without revealing it.

use crate::error::BillingError;
use chrono::{DateTime, Utc};
use fhub_derive::api_model;
use std::fmt;

pub(crate) const MAX_KEY_LEN: usize = 200;
pub(crate) const MIN_SECRET_LEN: usize = 8;

/// Payment providers a site can connect.
#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}

/// Whether the stored keys talk to the provider's test or live environment.
#[api_model]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMode {
    #[default]
    Test,
    Live,
}

/// Masked view of one provider configuration.
#[api_model]
#[derive(Clone)]
pub struct PaymentConfig {
    pub site_id: String,
    pub provider: PaymentProvider,
    pub publishable_key: String,
    pub mode: PaymentMode,
    /// Lowercase ISO 4217 code used as the default checkout currency.
    pub currency: String,
    /// Last four characters of the sealed secret key.
    pub secret_last4: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for installing or replacing a provider configuration.
#[api_model]
#[derive(Clone)]
pub struct UpsertPaymentConfig {
    pub publishable_key: String,
    /// Secret API key. Sealed at rest and never returned by any endpoint.
    pub secret_key: String,
    #[serde(default)]
    pub mode: PaymentMode,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "usd".to_owned()
}

impl PaymentProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
        }
    }

    /// Parses a path segment into a provider.
    ///
    /// # Errors
    /// [`BillingError::Validation`] for anything that is not a known provider.
    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            _ => Err(BillingError::Validation {
                message: format!("Unknown payment provider `{value}`").into(),
                context: None,
            }),
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PaymentMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UpsertPaymentConfig {
    /// Checks field shapes before any sealing work happens.
    ///
    /// # Errors
    /// [`BillingError::Validation`] with a field-specific message.
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.publishable_key.trim().is_empty() || self.publishable_key.len() > MAX_KEY_LEN {
            return Err(validation("Publishable key must be 1-200 characters"));
        }
        if self.secret_key.len() < MIN_SECRET_LEN || self.secret_key.len() > MAX_KEY_LEN {
            return Err(validation("Secret key must be 8-200 characters"));
        }
        if self.currency.len() != 3 || !self.currency.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(validation("Currency must be a lowercase ISO 4217 code"));
        }
        Ok(())
    }
}

fn validation(message: &'static str) -> BillingError {
    BillingError::Validation { message: message.into(), context: None }
}
