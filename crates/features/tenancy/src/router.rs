//! Route table for the tenancy slice.

use crate::handlers;
use fhub_kernel::server::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Site management and host resolution routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_site, handlers::list_sites))
        .routes(routes!(handlers::resolve_site))
        .routes(routes!(handlers::get_site, handlers::update_site, handlers::delete_site))
}
