//! Convenience re-exports for feature slices.

pub use crate::domain;
pub use crate::safe_nanoid;
pub use crate::security::guards::{
    Baseline, FeatureGuard, GuardError, RoleGuard, TierGuard, feature_enabled,
};
pub use crate::security::resource::ResourceGuard;

#[cfg(feature = "server")]
pub use crate::security::auth::AuthUser;
#[cfg(feature = "server")]
pub use crate::security::membership::MembershipResolver;
#[cfg(feature = "server")]
pub use crate::security::site::{SiteAccess, SiteResolver};
#[cfg(feature = "server")]
pub use crate::server::error::{ApiError, ApiErrorExt};
#[cfg(feature = "server")]
pub use crate::server::state::ApiState;
