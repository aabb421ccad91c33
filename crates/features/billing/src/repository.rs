//! SurrealDB-backed storage for payment-provider configs.
//!
//! One config per `(site, provider)`, stored under a composite record id.
//! The secret key is sealed before it reaches this module's queries and only
//! its `last4` ever leaves storage again.

use crate::error::{BillingError, BillingErrorExt};
use crate::models::{PaymentConfig, PaymentMode, PaymentProvider, UpsertPaymentConfig};
use crate::sealing::{SealedSecret, SecretSealer};
use fhub_database::surrealdb::sql::Datetime;
use fhub_database::{Database, RecordId, record_key};
use fhub_domain::constants::{PAYMENT_CONFIG, SITE};
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug, Deserialize)]
struct ConfigRow {
    site: RecordId,
    provider: PaymentProvider,
    publishable_key: String,
    mode: PaymentMode,
    currency: String,
    sealed: SealedSecret,
    created_at: Datetime,
    updated_at: Datetime,
}

impl From<ConfigRow> for PaymentConfig {
    fn from(row: ConfigRow) -> Self {
        Self {
            site_id: row.site.to_string(),
            provider: row.provider,
            publishable_key: row.publishable_key,
            mode: row.mode,
            currency: row.currency,
            secret_last4: row.sealed.last4,
            created_at: row.created_at.into(),
            updated_at: row.updated_at.into(),
        }
    }
}

/// Payment config storage, keyed by `[site, provider]`.
#[derive(Debug, Clone)]
pub struct PaymentConfigRepository {
    db: Database,
}

impl PaymentConfigRepository {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Installs or replaces the config for one provider, sealing the secret.
    ///
    /// # Errors
    /// [`BillingError::Validation`] for malformed input,
    /// [`BillingError::Sealing`] when the secret cannot be sealed.
    pub async fn upsert(
        &self,
        site_id: &str,
        provider: PaymentProvider,
        mut req: UpsertPaymentConfig,
        sealer: &SecretSealer,
    ) -> Result<PaymentConfig, BillingError> {
        req.validate()?;
        let secret = Zeroizing::new(std::mem::take(&mut req.secret_key));
        let sealed = sealer.seal(&secret, site_id, provider)?;

        let mut response = self
            .db
            .query(format!(
                "UPSERT type::thing('{PAYMENT_CONFIG}', [$site, $provider]) SET \
                 site = type::thing('{SITE}', $site), provider = $provider, \
                 publishable_key = $pk, mode = $mode, currency = $currency, \
                 sealed = $sealed, created_at = created_at ?? time::now(), \
                 updated_at = time::now()"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("provider", provider.as_str()))
            .bind(("pk", req.publishable_key))
            .bind(("mode", req.mode.as_str()))
            .bind(("currency", req.currency))
            .bind(("sealed", sealed))
            .await
            .context("Upserting payment config")?;
        let rows: Vec<ConfigRow> = response.take(0).context("Decoding payment config")?;
        debug!(site = %site_id, provider = %provider, "Payment config sealed");

        rows.into_iter().next().map(PaymentConfig::from).ok_or_else(|| BillingError::Internal {
            message: "Upsert returned no record".into(),
            context: None,
        })
    }

    /// Loads the masked config for one provider.
    ///
    /// # Errors
    /// [`BillingError::NotFound`] if the site has no config for `provider`.
    pub async fn get(
        &self,
        site_id: &str,
        provider: PaymentProvider,
    ) -> Result<PaymentConfig, BillingError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM type::thing('{PAYMENT_CONFIG}', [$site, $provider])"))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("provider", provider.as_str()))
            .await
            .context("Loading payment config")?;
        let rows: Vec<ConfigRow> = response.take(0).context("Decoding payment config")?;
        rows.into_iter().next().map(PaymentConfig::from).ok_or_else(|| not_found(provider))
    }

    /// All configs of a site, ordered by provider.
    ///
    /// # Errors
    /// [`BillingError::Surreal`] on storage failure.
    pub async fn list(&self, site_id: &str) -> Result<Vec<PaymentConfig>, BillingError> {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {PAYMENT_CONFIG} WHERE site = type::thing('{SITE}', $site) \
                 ORDER BY provider"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .await
            .context("Listing payment configs")?;
        let rows: Vec<ConfigRow> = response.take(0).context("Decoding payment config list")?;
        Ok(rows.into_iter().map(PaymentConfig::from).collect())
    }

    /// Removes the config for one provider.
    ///
    /// # Errors
    /// [`BillingError::NotFound`] if the site has no config for `provider`.
    pub async fn delete(
        &self,
        site_id: &str,
        provider: PaymentProvider,
    ) -> Result<PaymentConfig, BillingError> {
        let mut response = self
            .db
            .query(format!(
                "DELETE type::thing('{PAYMENT_CONFIG}', [$site, $provider]) RETURN BEFORE"
            ))
            .bind(("site", record_key(site_id).to_owned()))
            .bind(("provider", provider.as_str()))
            .await
            .context("Deleting payment config")?;
        let rows: Vec<ConfigRow> = response.take(0).context("Decoding deleted payment config")?;
        let config =
            rows.into_iter().next().map(PaymentConfig::from).ok_or_else(|| not_found(provider))?;
        debug!(site = %config.site_id, provider = %config.provider, "Payment config deleted");
        Ok(config)
    }
}

fn not_found(provider: PaymentProvider) -> BillingError {
    BillingError::NotFound {
        message: format!("No {provider} configuration for this site").into(),
        context: None,
    }
}
