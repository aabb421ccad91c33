//! Route table for the pages slice.

use crate::handlers;
use fhub_kernel::server::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Page management, version history, publishing, and storefront lookups.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::create_page, handlers::list_pages))
        .routes(routes!(handlers::published_page))
        .routes(routes!(handlers::draft_page))
        .routes(routes!(handlers::get_page, handlers::update_page, handlers::delete_page))
        .routes(routes!(handlers::save_content))
        .routes(routes!(handlers::reorder_page_sections))
        .routes(routes!(handlers::list_versions))
        .routes(routes!(handlers::get_version))
        .routes(routes!(handlers::restore_version))
        .routes(routes!(handlers::publish_page))
        .routes(routes!(handlers::unpublish_page))
        .routes(routes!(handlers::preview_link))
}
