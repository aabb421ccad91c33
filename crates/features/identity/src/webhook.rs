//! Svix-compatible webhook verification and the Clerk payload shapes.
//!
//! Signature scheme: HMAC-SHA256 over `"{id}.{timestamp}.{payload}"` with the
//! base64-decoded portion of the `whsec_` secret as key. The signature header
//! carries space-separated `v1,<base64>` candidates; any constant-time match
//! passes. Timestamps outside the configured tolerance are rejected before
//! any MAC work.

use crate::error::IdentityError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fhub_domain::config::WebhookConfig;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Header names the provider signs with.
pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Verifies inbound webhook deliveries against the configured secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_seconds: i64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"<redacted>")
            .field("tolerance_seconds", &self.tolerance_seconds)
            .finish()
    }
}

impl WebhookVerifier {
    /// Builds a verifier from the configured `whsec_` secret.
    ///
    /// # Errors
    /// Returns [`IdentityError::Config`] when the secret is not valid base64.
    pub fn new(config: &WebhookConfig) -> Result<Self, IdentityError> {
        let encoded =
            config.signing_secret.strip_prefix("whsec_").unwrap_or(&config.signing_secret);
        let key = BASE64.decode(encoded).map_err(|err| IdentityError::Config {
            message: format!("Webhook signing secret is not valid base64: {err}").into(),
            context: None,
        })?;
        if key.is_empty() {
            return Err(IdentityError::Config {
                message: "Webhook signing secret is empty".into(),
                context: None,
            });
        }
        Ok(Self { key, tolerance_seconds: config.tolerance_seconds })
    }

    /// Checks one delivery. `now` is the verifier's clock in unix seconds so
    /// tolerance behavior stays testable.
    ///
    /// # Errors
    /// Returns [`IdentityError::Unauthorized`] for a stale timestamp or a
    /// signature that matches no candidate.
    pub fn verify(
        &self,
        message_id: &str,
        timestamp: &str,
        signatures: &str,
        payload: &[u8],
        now: i64,
    ) -> Result<(), IdentityError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| unauthorized("Webhook timestamp is not a unix second count"))?;
        if (now - ts).abs() > self.tolerance_seconds {
            return Err(unauthorized("Webhook timestamp outside tolerance"));
        }

        let expected = self.sign(message_id, timestamp, payload)?;
        let matched = signatures.split_whitespace().any(|candidate| {
            candidate
                .strip_prefix("v1,")
                .is_some_and(|sig| fhub_kernel::security::ct_eq(sig, &expected))
        });
        if matched { Ok(()) } else { Err(unauthorized("No webhook signature matched")) }
    }

    /// Base64 signature for a message, used by verification and by tests
    /// constructing valid deliveries.
    ///
    /// # Errors
    /// Returns [`IdentityError::Internal`] if the key is rejected by the MAC.
    pub fn sign(
        &self,
        message_id: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> Result<String, IdentityError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|err| IdentityError::Internal {
                message: format!("Webhook key rejected: {err}").into(),
                context: None,
            })?;
        mac.update(message_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

fn unauthorized(message: &'static str) -> IdentityError {
    IdentityError::Unauthorized { message: message.into(), context: None }
}

/// Envelope of a Clerk event. Unknown event kinds are acknowledged unhandled.
#[derive(Debug, Deserialize)]
pub struct ClerkEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The subset of Clerk's user object this system mirrors.
#[derive(Debug, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmail>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClerkEmail {
    pub id: String,
    pub email_address: String,
}

/// Payload of a `user.deleted` event; only the id matters.
#[derive(Debug, Deserialize)]
pub struct ClerkDeleted {
    pub id: String,
}

/// Profile extracted from a `user.created` / `user.updated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredUser {
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ClerkUser {
    /// Flattens the provider shape into the mirrored profile.
    ///
    /// # Errors
    /// Returns [`IdentityError::Validation`] when the payload carries no
    /// email address at all.
    pub fn into_mirrored(self) -> Result<MirroredUser, IdentityError> {
        let email = self
            .primary_email_address_id
            .as_ref()
            .and_then(|primary| {
                self.email_addresses.iter().find(|candidate| &candidate.id == primary)
            })
            .or_else(|| self.email_addresses.first())
            .map(|found| found.email_address.clone())
            .ok_or_else(|| IdentityError::Validation {
                message: "User payload carries no email address".into(),
                context: None,
            })?;

        let name = match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(single), None) | (None, Some(single)) => Some(single.to_owned()),
            (None, None) => None,
        };

        Ok(MirroredUser { external_id: self.id, email, name, avatar_url: self.image_url })
    }
}
