//! Wire models for the tenancy surface.

use crate::error::TenancyError;
use chrono::{DateTime, Utc};
use fhub_derive::api_model;
use fhub_domain::capabilities::Tier;
use serde_json::Value;

const MAX_SLUG_LEN: usize = 64;
const MAX_NAME_LEN: usize = 120;

/// A tenant site as stored and returned by the API.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Site {
    /// Full record id (`site:<key>`).
    pub id: String,
    pub name: String,
    /// URL-safe identifier, unique across the platform.
    pub slug: String,
    /// Custom domains and subdomain hosts routed to this site.
    pub hosts: Vec<String>,
    pub tier: Tier,
    /// Free-form flag object checked by dotted-path lookup.
    pub features: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /sites`.
#[api_model]
pub struct CreateSite {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default = "empty_object")]
    pub features: Value,
}

/// Partial update for `PATCH /sites/{id}`. Omitted fields keep their value;
/// the slug is immutable after creation.
#[api_model]
pub struct UpdateSite {
    pub name: Option<String>,
    pub hosts: Option<Vec<String>>,
    pub tier: Option<Tier>,
    pub features: Option<Value>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl CreateSite {
    /// Rejects malformed names and slugs before anything touches storage.
    ///
    /// # Errors
    /// Returns [`TenancyError::Validation`] describing the first offending field.
    pub fn validate(&self) -> Result<(), TenancyError> {
        validate_name(&self.name)?;
        validate_slug(&self.slug)?;
        validate_features(&self.features)
    }
}

impl UpdateSite {
    /// Same field rules as [`CreateSite::validate`], applied to present fields only.
    ///
    /// # Errors
    /// Returns [`TenancyError::Validation`] describing the first offending field.
    pub fn validate(&self) -> Result<(), TenancyError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(features) = &self.features {
            validate_features(features)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), TenancyError> {
    if name.trim().is_empty() {
        return Err(invalid("Name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("Name is too long"));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), TenancyError> {
    let shape_ok = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if shape_ok {
        Ok(())
    } else {
        Err(invalid("Slug must be lowercase letters, digits, and inner hyphens"))
    }
}

fn validate_features(features: &Value) -> Result<(), TenancyError> {
    if features.is_object() {
        Ok(())
    } else {
        Err(invalid("Features must be a JSON object"))
    }
}

fn invalid(message: &'static str) -> TenancyError {
    TenancyError::Validation { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_shape_is_enforced() {
        let mut req = CreateSite {
            name: "Acme".to_owned(),
            slug: "acme-landing".to_owned(),
            hosts: Vec::new(),
            tier: Tier::Free,
            features: empty_object(),
        };
        assert!(req.validate().is_ok());

        for bad in ["", "-acme", "acme-", "Acme", "acme_landing", "acme.landing"] {
            req.slug = bad.to_owned();
            assert!(req.validate().is_err(), "slug `{bad}` should be rejected");
        }
    }

    #[test]
    fn features_must_be_an_object() {
        let req = CreateSite {
            name: "Acme".to_owned(),
            slug: "acme".to_owned(),
            hosts: Vec::new(),
            tier: Tier::Free,
            features: serde_json::json!(["not", "an", "object"]),
        };
        assert!(matches!(req.validate(), Err(TenancyError::Validation { .. })));
    }

    #[test]
    fn update_defaults_to_all_none() {
        let patch: UpdateSite = serde_json::from_str("{}").expect("empty patch");
        assert!(patch.name.is_none());
        assert!(patch.hosts.is_none());
        assert!(patch.tier.is_none());
        assert!(patch.features.is_none());
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn create_fills_defaults() {
        let req: CreateSite =
            serde_json::from_str(r#"{"name": "Acme", "slug": "acme"}"#).expect("minimal create");
        assert_eq!(req.tier, Tier::Free);
        assert!(req.hosts.is_empty());
        assert!(req.features.is_object());
    }
}
