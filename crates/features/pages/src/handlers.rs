//! HTTP surface for page management, version history, and publishing.
//!
//! Dashboard routes load the page first and check the caller's role in the
//! owning site. The two storefront routes are public: the published lookup
//! only ever returns live snapshots, and the draft lookup demands a preview
//! token scoped to the exact page.

use crate::Pages;
use crate::models::{
    CreatePage, Page, PageSummary, PageVersion, PreviewLink, RenderablePage, ReorderSections,
    UpdatePage, VersionSummary,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use fhub_derive::api_handler;
use fhub_domain::blocks::PageTree;
use fhub_domain::capabilities::{Capabilities, Role};
use fhub_domain::constants::{
    BASELINE_PAGE_LIMIT, PAGE, PAGES_TAG, SITE, UNLIMITED_PAGES, VERSION_HISTORY,
};
use fhub_domain::events::ContentChanged;
use fhub_kernel::prelude::*;
use fhub_kernel::security::preview::{issue_preview_token, verify_preview_token};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub(super) struct PathQuery {
    /// Storefront path, canonical or not.
    path: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub(super) struct DraftQuery {
    /// Storefront path, canonical or not.
    path: String,
    /// Preview token covering the page at this path.
    token: String,
}

#[api_handler(
    post,
    path = "/sites/{id}/pages",
    params(("id" = String, Path, description = "Site record id")),
    request_body = CreatePage,
    responses((status = CREATED, description = "Page created", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn create_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreatePage>,
) -> Result<(StatusCode, Json<Page>), ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let pages = state.try_get_slice::<Pages>()?;
    let access = site_access(&state, &id).await?;
    let unlimited = FeatureGuard::require(
        &access.features,
        access.tier,
        UNLIMITED_PAGES,
        Baseline::Capability(Capabilities::UNLIMITED_PAGES),
    )
    .is_ok();
    if !unlimited && pages.pages.count_for_site(&id).await? >= BASELINE_PAGE_LIMIT {
        return Err(ApiError::Forbidden {
            message: format!("Page limit of {BASELINE_PAGE_LIMIT} reached on the current plan")
                .into(),
            context: None,
        });
    }

    let page = pages.pages.create(&id, req).await?;
    info!(page = %page.id, site = %page.site_id, user = %user.id, "Page created");
    Ok((StatusCode::CREATED, Json(page)))
}

#[api_handler(
    get,
    path = "/sites/{id}/pages",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = OK, description = "Pages of the site", body = [PageSummary])),
    tag = PAGES_TAG
)]
pub(super) async fn list_pages(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PageSummary>>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Viewer)?;

    let pages = state.try_get_slice::<Pages>()?;
    Ok(Json(pages.pages.list(&id).await?))
}

/// Public endpoint the storefront hits on every uncached request.
#[api_handler(
    get,
    path = "/sites/{id}/pages/published",
    params(("id" = String, Path, description = "Site record id"), PathQuery),
    responses((status = OK, description = "Live snapshot at this path", body = RenderablePage)),
    tag = PAGES_TAG
)]
pub(super) async fn published_page(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<PathQuery>,
) -> Result<Json<RenderablePage>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.find_published(&id, &query.path).await?;
    page.and_then(Page::published_view)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No published page at `{}`", query.path)))
}

/// Public, but useless without a valid preview token for the exact page.
#[api_handler(
    get,
    path = "/sites/{id}/pages/draft",
    params(("id" = String, Path, description = "Site record id"), DraftQuery),
    responses((status = OK, description = "Draft at this path", body = RenderablePage)),
    tag = PAGES_TAG
)]
pub(super) async fn draft_page(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<DraftQuery>,
) -> Result<Json<RenderablePage>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let claims = verify_preview_token(&state.config.security.jwt, &query.token)?;

    let pages = state.try_get_slice::<Pages>()?;
    let page = pages
        .pages
        .find_by_path(&id, &query.path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No page at `{}`", query.path)))?;
    if claims.site != page.site_id || claims.sub != page.id {
        return Err(ApiError::Forbidden {
            message: "Preview token does not cover this page".into(),
            context: None,
        });
    }
    Ok(Json(page.draft_view()))
}

#[api_handler(
    get,
    path = "/pages/{id}",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = OK, description = "Page by id", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn get_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Viewer).await?;
    Ok(Json(page))
}

#[api_handler(
    patch,
    path = "/pages/{id}",
    params(("id" = String, Path, description = "Page record id")),
    request_body = UpdatePage,
    responses((status = OK, description = "Updated page", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn update_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdatePage>,
) -> Result<Json<Page>, ApiError> {
    let before = page_for_role(&state, &user, id, Role::Editor).await?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.update(&before.id, patch).await?;

    // Path and title feed the storefront directly; a change to either is
    // visible without republishing.
    let moved = page.path != before.path;
    if page.published.is_some() && (moved || page.title != before.title) {
        let mut paths = vec![page.path.clone()];
        if moved {
            paths.push(before.path);
        }
        state.notify_content_changed(ContentChanged::paths(&page.site_id, paths));
    }
    Ok(Json(page))
}

#[api_handler(
    delete,
    path = "/pages/{id}",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = NO_CONTENT, description = "Page deleted")),
    tag = PAGES_TAG
)]
pub(super) async fn delete_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Admin).await?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.delete(&page.id).await?;
    if page.published.is_some() {
        state.notify_content_changed(ContentChanged::paths(&page.site_id, vec![page.path.clone()]));
    }
    info!(page = %page.id, user = %user.id, "Page deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the draft tree. The storefront is untouched until a publish.
#[api_handler(
    put,
    path = "/pages/{id}/content",
    params(("id" = String, Path, description = "Page record id")),
    request_body = PageTree,
    responses((status = OK, description = "Page with the new draft", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn save_content(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(tree): Json<PageTree>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    let pages = state.try_get_slice::<Pages>()?;
    Ok(Json(pages.pages.save_content(&page.id, tree).await?))
}

#[api_handler(
    post,
    path = "/pages/{id}/reorder",
    params(("id" = String, Path, description = "Page record id")),
    request_body = ReorderSections,
    responses((status = OK, description = "Page with reordered sections", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn reorder_page_sections(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ReorderSections>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    let pages = state.try_get_slice::<Pages>()?;
    Ok(Json(pages.pages.reorder_sections(&page.id, &req.section_ids).await?))
}

#[api_handler(
    get,
    path = "/pages/{id}/versions",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = OK, description = "History, newest first", body = [VersionSummary])),
    tag = PAGES_TAG
)]
pub(super) async fn list_versions(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<VersionSummary>>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Viewer).await?;
    require_version_history(&state, &page.site_id).await?;

    let pages = state.try_get_slice::<Pages>()?;
    Ok(Json(pages.pages.list_versions(&page.id).await?))
}

#[api_handler(
    get,
    path = "/pages/{id}/versions/{number}",
    params(
        ("id" = String, Path, description = "Page record id"),
        ("number" = i64, Path, description = "Version number")
    ),
    responses((status = OK, description = "One snapshot", body = PageVersion)),
    tag = PAGES_TAG
)]
pub(super) async fn get_version(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, number)): Path<(String, i64)>,
) -> Result<Json<PageVersion>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Viewer).await?;
    require_version_history(&state, &page.site_id).await?;

    let pages = state.try_get_slice::<Pages>()?;
    Ok(Json(pages.pages.get_version(&page.id, number).await?))
}

#[api_handler(
    post,
    path = "/pages/{id}/versions/{number}/restore",
    params(
        ("id" = String, Path, description = "Page record id"),
        ("number" = i64, Path, description = "Version number")
    ),
    responses((status = OK, description = "Page with the restored draft", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn restore_version(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, number)): Path<(String, i64)>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    require_version_history(&state, &page.site_id).await?;

    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.restore_version(&page.id, number).await?;
    info!(page = %page.id, version = number, user = %user.id, "Version restored");
    Ok(Json(page))
}

#[api_handler(
    post,
    path = "/pages/{id}/publish",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = OK, description = "Published page", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn publish_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.publish(&page.id).await?;
    state.notify_content_changed(ContentChanged::paths(&page.site_id, vec![page.path.clone()]));
    info!(page = %page.id, user = %user.id, "Page published");
    Ok(Json(page))
}

#[api_handler(
    post,
    path = "/pages/{id}/unpublish",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = OK, description = "Unpublished page", body = Page)),
    tag = PAGES_TAG
)]
pub(super) async fn unpublish_page(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Page>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.unpublish(&page.id).await?;
    state.notify_content_changed(ContentChanged::paths(&page.site_id, vec![page.path.clone()]));
    info!(page = %page.id, user = %user.id, "Page unpublished");
    Ok(Json(page))
}

#[api_handler(
    post,
    path = "/pages/{id}/preview-link",
    params(("id" = String, Path, description = "Page record id")),
    responses((status = OK, description = "Preview token for this page", body = PreviewLink)),
    tag = PAGES_TAG
)]
pub(super) async fn preview_link(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PreviewLink>, ApiError> {
    let page = page_for_role(&state, &user, id, Role::Editor).await?;
    let security = &state.config.security;
    let token = issue_preview_token(&security.jwt, &security.preview, &page.id, &page.site_id)?;
    Ok(Json(PreviewLink { token, path: page.path, expires_in: security.preview.ttl_seconds }))
}

/// Loads the page and checks the caller's role in the site that owns it.
async fn page_for_role(
    state: &ApiState,
    user: &AuthUser,
    id: String,
    required: Role,
) -> Result<Page, ApiError> {
    let id = ResourceGuard::verify(id, PAGE)?;
    let pages = state.try_get_slice::<Pages>()?;
    let page = pages.pages.get(&id).await?;
    RoleGuard::require(state.memberships.role(&user.id, &page.site_id).await?, required)?;
    Ok(page)
}

async fn site_access(state: &ApiState, site_id: &str) -> Result<SiteAccess, ApiError> {
    state
        .sites
        .access(site_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Site `{site_id}` does not exist")))
}

/// History endpoints sit behind the `version_history` feature; snapshots are
/// still written on every save so history is intact after an upgrade.
async fn require_version_history(state: &ApiState, site_id: &str) -> Result<(), ApiError> {
    let access = site_access(state, site_id).await?;
    FeatureGuard::require(
        &access.features,
        access.tier,
        VERSION_HISTORY,
        Baseline::Capability(Capabilities::VERSION_HISTORY),
    )?;
    Ok(())
}
