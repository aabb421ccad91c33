//! Facade crate for `FunnelHub` features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `fhub` with the `server` feature flag.
//! - Call `fhub::init` to register feature slices; extend as new slices appear.
//! - Mount `fhub::server::router::api_router()` for the full REST surface.

use fhub_database::Database;
pub use fhub_domain as domain;
use fhub_domain::config::ApiConfig;
use fhub_event_bus::EventBus;
pub use fhub_kernel as kernel;

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        use fhub_kernel::server::state::ApiState;
        use utoipa_axum::router::OpenApiRouter;

        pub use fhub_kernel::server::router::system_router;

        /// System routes plus every feature slice's route table.
        #[must_use]
        pub fn api_router() -> OpenApiRouter<ApiState> {
            system_router()
                .merge(crate::features::tenancy::router::router())
                .merge(crate::features::identity::router::router())
                .merge(crate::features::pages::router::router())
                .merge(crate::features::content::router::router())
                .merge(crate::features::billing::router::router())
                .merge(crate::features::publishing::router::router())
        }
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use fhub_billing as billing;
    pub use fhub_content as content;
    pub use fhub_identity as identity;
    pub use fhub_pages as pages;
    pub use fhub_publishing as publishing;
    pub use fhub_tenancy as tenancy;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        #[cfg(feature = "server")]
        "tenancy",
        #[cfg(feature = "server")]
        "identity",
        #[cfg(feature = "server")]
        "pages",
        #[cfg(feature = "server")]
        "content",
        #[cfg(feature = "server")]
        "billing",
        #[cfg(feature = "server")]
        "publishing",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all enabled features for server mode.
///
/// Runs in dependency order: tenancy first, since the other slices hang
/// their records off sites, and publishing last, since it consumes the
/// content-changed queue the others feed.
///
/// # Errors
/// Returns an error if any feature initialization fails.
#[cfg(feature = "server")]
pub fn init(
    config: &ApiConfig,
    database: &Database,
    events: &EventBus,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error>> {
    let mut slices = Vec::new();

    // Tenancy
    slices.push(features::tenancy::init(database)?);

    // Identity (users, memberships, Clerk webhook)
    slices.push(features::identity::init(config, database)?);

    // Pages (drafts, versions, publishing)
    slices.push(features::pages::init(database)?);

    // Content (posts, menus, layouts)
    slices.push(features::content::init(database)?);

    // Billing (sealed payment provider configs)
    slices.push(features::billing::init(config, database)?);

    // Publishing (storefront revalidation worker)
    slices.push(features::publishing::init(config, events)?);

    Ok(slices)
}
