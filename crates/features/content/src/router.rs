//! Route table for the content slice.

use crate::handlers;
use fhub_kernel::server::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Posts, menus, and header/footer layouts.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_post, handlers::list_posts))
        .routes(routes!(handlers::get_post, handlers::update_post, handlers::delete_post))
        .routes(routes!(handlers::publish_post))
        .routes(routes!(handlers::unpublish_post))
        .routes(routes!(handlers::list_menus))
        .routes(routes!(handlers::get_menu, handlers::upsert_menu, handlers::delete_menu))
        .routes(routes!(handlers::get_layout, handlers::upsert_layout, handlers::delete_layout))
}
