//! Feature, tier, and role gates.
//!
//! All three guards are pure decision functions over already-loaded state.
//! Handlers convert [`GuardError`] into a 403 through the kernel `ApiError`.

use fhub_domain::capabilities::{Capabilities, Role, Tier};
use serde_json::Value;
use std::borrow::Cow;

#[fhub_derive::fhub_error]
pub enum GuardError {
    #[error("Access denied{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Raw flag lookup: `Some(bool)` when the dotted path lands on an actual
/// boolean, `None` when the path is missing or holds anything else.
///
/// Path segments are matched case-sensitively against object keys; no
/// coercion of strings or numbers.
pub fn explicit_flag(features: &Value, path: &str) -> Option<bool> {
    let mut node = features;
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    node.as_bool()
}

/// A feature is enabled only when the dotted path holds exactly `true`.
#[must_use]
pub fn feature_enabled(features: &Value, path: &str) -> bool {
    explicit_flag(features, path) == Some(true)
}

/// What decides when a site has no explicit flag at the guarded path.
#[derive(Debug, Clone, Copy)]
pub enum Baseline {
    /// Granted when the tier's capability set intersects these bits.
    Capability(Capabilities),
    /// Granted at or above this tier.
    MinTier(Tier),
    /// Never granted without an explicit flag.
    Denied,
}

/// Gates an operation on a site feature flag.
///
/// An explicit flag overrides the baseline in both directions: `true` grants
/// even on the free tier, `false` revokes even on the top tier. Without an
/// explicit flag the [`Baseline`] decides.
#[derive(Debug)]
pub struct FeatureGuard;

impl FeatureGuard {
    /// # Errors
    /// Returns [`GuardError::Forbidden`] when the flag resolves to denied.
    pub fn require(
        features: &Value,
        tier: Tier,
        flag: &str,
        baseline: Baseline,
    ) -> Result<(), GuardError> {
        let allowed = explicit_flag(features, flag).unwrap_or(match baseline {
            Baseline::Capability(bits) => tier.capabilities().intersects(bits),
            Baseline::MinTier(required) => tier.meets(required),
            Baseline::Denied => false,
        });

        if allowed {
            Ok(())
        } else {
            Err(GuardError::Forbidden {
                message: format!("Feature `{flag}` is not enabled for this site").into(),
                context: None,
            })
        }
    }
}

/// Gates an operation on the subscription ladder `Free < Starter < Pro < Scale`.
#[derive(Debug)]
pub struct TierGuard;

impl TierGuard {
    /// # Errors
    /// Returns [`GuardError::Forbidden`] when `tier` sits below `required`.
    pub fn require_at_least(tier: Tier, required: Tier) -> Result<(), GuardError> {
        if tier.meets(required) {
            Ok(())
        } else {
            Err(GuardError::Forbidden {
                message: format!("Requires the {required} plan or above").into(),
                context: Some(format!("Site is on {tier}").into()),
            })
        }
    }
}

/// Gates an operation on the membership ladder `Viewer < Editor < Admin < Owner`.
#[derive(Debug)]
pub struct RoleGuard;

impl RoleGuard {
    /// `None` means the caller has no membership in the site at all, which is
    /// denied the same way an insufficient role is.
    ///
    /// # Errors
    /// Returns [`GuardError::Forbidden`] when the role is missing or too low.
    pub fn require(role: Option<Role>, required: Role) -> Result<(), GuardError> {
        match role {
            Some(role) if role.meets(required) => Ok(()),
            Some(role) => Err(GuardError::Forbidden {
                message: format!("Requires the {required} role").into(),
                context: Some(format!("Caller is {role}").into()),
            }),
            None => Err(GuardError::Forbidden {
                message: "Not a member of this site".into(),
                context: None,
            }),
        }
    }
}
