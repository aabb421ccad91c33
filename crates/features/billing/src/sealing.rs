//! Secret-key sealing for stored payment configs.
//!
//! One ChaCha20-Poly1305 cipher per process, keyed by HKDF-SHA256 expansion of
//! the configured sealing key. Each seal draws a fresh random nonce and binds
//! the ciphertext to its `(site, provider)` pair through the AEAD associated
//! data, so a sealed blob copied onto another row fails authentication.

use crate::error::BillingError;
use crate::models::PaymentProvider;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use getrandom::fill;
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

const NONCE_LEN: usize = 12;
const HKDF_SALT: &[u8] = b"fhub-billing";
const KEY_INFO: &[u8] = b"v1_payment_secret:";

/// Sealed secret as stored in the `sealed` column. Never returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// Base64 nonce, unique per seal.
    pub nonce: String,
    /// Base64 ciphertext with the appended Poly1305 tag.
    pub ciphertext: String,
    /// Last four characters of the plaintext, kept for masked reads.
    pub last4: String,
}

/// Seals and unseals payment secrets with a process-wide derived key.
#[derive(Clone)]
pub struct SecretSealer {
    cipher: ChaCha20Poly1305,
}

impl fmt::Debug for SecretSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSealer").field("cipher", &"<redacted>").finish()
    }
}

impl SecretSealer {
    /// Derives the sealing cipher from the configured master key.
    ///
    /// # Errors
    /// Returns [`BillingError::Config`] for an empty master key or a failed
    /// key derivation.
    pub fn new(master_key: &str) -> Result<Self, BillingError> {
        if master_key.is_empty() {
            return Err(BillingError::Config {
                message: "Sealing key is empty".into(),
                context: None,
            });
        }

        let (_, hk) = Hkdf::<Sha256>::extract(Some(HKDF_SALT), master_key.as_bytes());
        let mut key = [0u8; 32];
        hk.expand(KEY_INFO, &mut key).map_err(|_| BillingError::Config {
            message: "Key derivation failed".into(),
            context: None,
        })?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        key.zeroize();
        Ok(Self { cipher })
    }

    /// Seals a secret for one `(site, provider)` slot.
    ///
    /// # Errors
    /// Returns [`BillingError::Sealing`] when the system RNG or the AEAD
    /// encryption fails.
    pub fn seal(
        &self,
        secret: &str,
        site_id: &str,
        provider: PaymentProvider,
    ) -> Result<SealedSecret, BillingError> {
        let mut nonce = [0u8; NONCE_LEN];
        fill(&mut nonce).map_err(|_| sealing("System RNG unavailable"))?;

        let aad = binding(site_id, provider);
        let payload = Payload { msg: secret.as_bytes(), aad: &aad };
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), payload)
            .map_err(|_| sealing("AEAD encryption failed"))?;

        Ok(SealedSecret {
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
            last4: last4(secret),
        })
    }

    /// Recovers the plaintext secret for server-side provider calls.
    ///
    /// # Errors
    /// Returns [`BillingError::Sealing`] for malformed blobs, a wrong
    /// `(site, provider)` binding, or a key mismatch.
    pub fn unseal(
        &self,
        sealed: &SealedSecret,
        site_id: &str,
        provider: PaymentProvider,
    ) -> Result<Zeroizing<String>, BillingError> {
        let nonce =
            BASE64.decode(&sealed.nonce).map_err(|_| sealing("Nonce is not valid base64"))?;
        if nonce.len() != NONCE_LEN {
            return Err(sealing("Nonce has the wrong length"));
        }
        let ciphertext = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|_| sealing("Ciphertext is not valid base64"))?;

        let aad = binding(site_id, provider);
        let payload = Payload { msg: ciphertext.as_slice(), aad: &aad };
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), payload)
            .map_err(|_| sealing("AEAD authentication failed"))?;

        String::from_utf8(plain).map(Zeroizing::new).map_err(|err| {
            let mut bytes = err.into_bytes();
            bytes.zeroize();
            sealing("Unsealed secret is not valid UTF-8")
        })
    }
}

/// AEAD associated data tying a sealed blob to its row.
fn binding(site_id: &str, provider: PaymentProvider) -> Vec<u8> {
    format!("{site_id}/{}", provider.as_str()).into_bytes()
}

fn last4(secret: &str) -> String {
    let skip = secret.chars().count().saturating_sub(4);
    secret.chars().skip(skip).collect()
}

fn sealing(message: &'static str) -> BillingError {
    BillingError::Sealing { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealer() -> SecretSealer {
        SecretSealer::new("test-master-key").expect("sealer")
    }

    #[test]
    fn round_trip_recovers_the_secret() {
        let sealer = sealer();
        let sealed = sealer
            .seal("sk_test_4eC39HqLyjWDarjtT1zdp7dc", "site:one", PaymentProvider::Stripe)
            .expect("seal");
        assert_eq!(sealed.last4, "p7dc");
        assert_ne!(sealed.ciphertext, "sk_test_4eC39HqLyjWDarjtT1zdp7dc");

        let plain = sealer.unseal(&sealed, "site:one", PaymentProvider::Stripe).expect("unseal");
        assert_eq!(plain.as_str(), "sk_test_4eC39HqLyjWDarjtT1zdp7dc");
    }

    #[test]
    fn nonces_differ_between_seals() {
        let sealer = sealer();
        let a = sealer.seal("sk_secret_1", "site:one", PaymentProvider::Stripe).expect("seal");
        let b = sealer.seal("sk_secret_1", "site:one", PaymentProvider::Stripe).expect("seal");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn sealed_blobs_are_bound_to_their_slot() {
        let sealer = sealer();
        let sealed =
            sealer.seal("sk_secret_1", "site:one", PaymentProvider::Stripe).expect("seal");

        assert!(sealer.unseal(&sealed, "site:two", PaymentProvider::Stripe).is_err());
        assert!(sealer.unseal(&sealed, "site:one", PaymentProvider::Paypal).is_err());
    }

    #[test]
    fn a_different_master_key_cannot_unseal() {
        let sealed = sealer()
            .seal("sk_secret_1", "site:one", PaymentProvider::Stripe)
            .expect("seal");
        let other = SecretSealer::new("another-master-key").expect("sealer");
        assert!(other.unseal(&sealed, "site:one", PaymentProvider::Stripe).is_err());
    }

    #[test]
    fn tampered_blobs_fail() {
        let sealer = sealer();
        let mut sealed =
            sealer.seal("sk_secret_1", "site:one", PaymentProvider::Stripe).expect("seal");
        sealed.ciphertext = BASE64.encode(b"not the real ciphertext");
        assert!(sealer.unseal(&sealed, "site:one", PaymentProvider::Stripe).is_err());

        assert!(SecretSealer::new("").is_err());
    }

    #[test]
    fn last4_respects_character_boundaries() {
        assert_eq!(last4("sk_live_abcd"), "abcd");
        assert_eq!(last4("ab"), "ab");
    }
}
