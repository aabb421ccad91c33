//! HTTP surface for site management and host resolution.

use crate::Tenancy;
use crate::models::{CreateSite, Site, UpdateSite};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use fhub_derive::api_handler;
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{SITE, TENANCY_TAG};
use fhub_domain::events::ContentChanged;
use fhub_kernel::prelude::*;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub(super) struct ResolveQuery {
    /// Request `Host` value, with or without a port.
    host: String,
}

#[api_handler(
    post,
    path = "/sites",
    request_body = CreateSite,
    responses((status = CREATED, description = "Site created", body = Site)),
    tag = TENANCY_TAG
)]
pub(super) async fn create_site(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(req): Json<CreateSite>,
) -> Result<(StatusCode, Json<Site>), ApiError> {
    let tenancy = state.try_get_slice::<Tenancy>()?;
    let site = tenancy.sites.create(req, &user.id).await?;
    info!(site = %site.id, user = %user.id, "Site created");
    Ok((StatusCode::CREATED, Json(site)))
}

#[api_handler(
    get,
    path = "/sites",
    responses((status = OK, description = "Sites the caller belongs to", body = [Site])),
    tag = TENANCY_TAG
)]
pub(super) async fn list_sites(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<Site>>, ApiError> {
    let tenancy = state.try_get_slice::<Tenancy>()?;
    Ok(Json(tenancy.sites.list_for_user(&user.id).await?))
}

#[api_handler(
    get,
    path = "/sites/{id}",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = OK, description = "Site by id", body = Site)),
    tag = TENANCY_TAG
)]
pub(super) async fn get_site(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Site>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Viewer)?;

    let tenancy = state.try_get_slice::<Tenancy>()?;
    Ok(Json(tenancy.sites.get(&id).await?))
}

#[api_handler(
    patch,
    path = "/sites/{id}",
    params(("id" = String, Path, description = "Site record id")),
    request_body = UpdateSite,
    responses((status = OK, description = "Updated site", body = Site)),
    tag = TENANCY_TAG
)]
pub(super) async fn update_site(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateSite>,
) -> Result<Json<Site>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Admin)?;

    let tenancy = state.try_get_slice::<Tenancy>()?;
    let site = tenancy.sites.update(&id, patch).await?;
    state.sites.invalidate(&site.id);
    state.notify_content_changed(ContentChanged::site_wide(&site.id));
    Ok(Json(site))
}

#[api_handler(
    delete,
    path = "/sites/{id}",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = NO_CONTENT, description = "Site deleted")),
    tag = TENANCY_TAG
)]
pub(super) async fn delete_site(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Owner)?;

    let tenancy = state.try_get_slice::<Tenancy>()?;
    let site = tenancy.sites.delete(&id).await?;
    state.sites.invalidate(&site.id);
    state.notify_content_changed(ContentChanged::site_wide(&site.id));
    info!(site = %site.id, user = %user.id, "Site deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Public endpoint the storefront hits to map an incoming `Host` to a site.
#[api_handler(
    get,
    path = "/sites/resolve",
    params(ResolveQuery),
    responses((status = OK, description = "Site owning the host", body = Site)),
    tag = TENANCY_TAG
)]
pub(super) async fn resolve_site(
    State(state): State<ApiState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Site>, ApiError> {
    let tenancy = state.try_get_slice::<Tenancy>()?;
    let site = tenancy.sites.resolve_host(&query.host).await?;
    site.map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No site for host `{}`", query.host)))
}
