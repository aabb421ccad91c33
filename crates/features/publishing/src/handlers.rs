//! Manual revalidation trigger.

use crate::models::RevalidateRequest;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use fhub_derive::api_handler;
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{PUBLISHING_TAG, SITE};
use fhub_domain::events::ContentChanged;
use fhub_kernel::prelude::*;
use tracing::info;

/// Queues the same event the content slices emit, so a stuck storefront cache
/// can be flushed without touching any content.
#[api_handler(
    post,
    path = "/sites/{id}/revalidate",
    params(("id" = String, Path, description = "Site record id")),
    request_body = RevalidateRequest,
    responses((status = ACCEPTED, description = "Revalidation queued")),
    tag = PUBLISHING_TAG
)]
pub(super) async fn revalidate_site(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RevalidateRequest>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Admin)?;

    let event = if req.paths.is_empty() {
        ContentChanged::site_wide(&id)
    } else {
        ContentChanged::paths(&id, req.paths)
    };
    state.notify_content_changed(event);
    info!(site = %id, user = %user.id, "Manual revalidation queued");
    Ok(StatusCode::ACCEPTED)
}
