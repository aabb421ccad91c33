//! Route table for the identity slice.

use crate::handlers;
use fhub_kernel::server::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// User, membership and webhook routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_user, handlers::lookup_user))
        .routes(routes!(handlers::get_user, handlers::update_user, handlers::delete_user))
        .routes(routes!(handlers::list_members))
        .routes(routes!(handlers::assign_role, handlers::remove_member))
        .routes(routes!(handlers::clerk_webhook))
}
