//! HTTP surface for posts, menus, and layouts.
//!
//! Storefront-facing reads (single menu, single layout) are public; the rest
//! requires a membership role in the owning site. Mutations that can change
//! rendered output emit a site-wide content-changed event, since menus and
//! layouts appear on every page.

use crate::Content;
use crate::models::{
    CreatePost, Layout, LayoutKind, Menu, Post, PostSummary, UpdatePost, UpsertLayout,
    UpsertMenu,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use fhub_derive::api_handler;
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{CONTENT_TAG, POST, SITE};
use fhub_domain::events::ContentChanged;
use fhub_kernel::prelude::*;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub(super) struct TagQuery {
    /// Narrow the listing to posts carrying this tag.
    #[serde(default)]
    tag: Option<String>,
}

#[api_handler(
    post,
    path = "/sites/{id}/posts",
    params(("id" = String, Path, description = "Site record id")),
    request_body = CreatePost,
    responses((status = CREATED, description = "Post created", body = Post)),
    tag = CONTENT_TAG
)]
pub(super) async fn create_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.create(&id, req).await?;
    info!(post = %post.id, site = %post.site_id, user = %user.id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[api_handler(
    get,
    path = "/sites/{id}/posts",
    params(("id" = String, Path, description = "Site record id"), TagQuery),
    responses((status = OK, description = "Posts of the site", body = [PostSummary])),
    tag = CONTENT_TAG
)]
pub(super) async fn list_posts(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<TagQuery>,
) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Viewer)?;

    let content = state.try_get_slice::<Content>()?;
    Ok(Json(content.posts.list(&id, query.tag.as_deref()).await?))
}

#[api_handler(
    get,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post record id")),
    responses((status = OK, description = "Post by id", body = Post)),
    tag = CONTENT_TAG
)]
pub(super) async fn get_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = post_for_role(&state, &user, id, Role::Viewer).await?;
    Ok(Json(post))
}

#[api_handler(
    patch,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post record id")),
    request_body = UpdatePost,
    responses((status = OK, description = "Updated post", body = Post)),
    tag = CONTENT_TAG
)]
pub(super) async fn update_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdatePost>,
) -> Result<Json<Post>, ApiError> {
    let before = post_for_role(&state, &user, id, Role::Editor).await?;
    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.update(&before.id, patch).await?;
    if post.published {
        state.notify_content_changed(ContentChanged::site_wide(&post.site_id));
    }
    Ok(Json(post))
}

#[api_handler(
    delete,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post record id")),
    responses((status = NO_CONTENT, description = "Post deleted")),
    tag = CONTENT_TAG
)]
pub(super) async fn delete_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = post_for_role(&state, &user, id, Role::Editor).await?;
    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.delete(&post.id).await?;
    if post.published {
        state.notify_content_changed(ContentChanged::site_wide(&post.site_id));
    }
    info!(post = %post.id, user = %user.id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/posts/{id}/publish",
    params(("id" = String, Path, description = "Post record id")),
    responses((status = OK, description = "Published post", body = Post)),
    tag = CONTENT_TAG
)]
pub(super) async fn publish_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = post_for_role(&state, &user, id, Role::Editor).await?;
    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.publish(&post.id).await?;
    state.notify_content_changed(ContentChanged::site_wide(&post.site_id));
    info!(post = %post.id, user = %user.id, "Post published");
    Ok(Json(post))
}

#[api_handler(
    post,
    path = "/posts/{id}/unpublish",
    params(("id" = String, Path, description = "Post record id")),
    responses((status = OK, description = "Unpublished post", body = Post)),
    tag = CONTENT_TAG
)]
pub(super) async fn unpublish_post(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = post_for_role(&state, &user, id, Role::Editor).await?;
    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.unpublish(&post.id).await?;
    state.notify_content_changed(ContentChanged::site_wide(&post.site_id));
    info!(post = %post.id, user = %user.id, "Post unpublished");
    Ok(Json(post))
}

#[api_handler(
    get,
    path = "/sites/{id}/menus",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = OK, description = "Menus of the site", body = [Menu])),
    tag = CONTENT_TAG
)]
pub(super) async fn list_menus(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Menu>>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Viewer)?;

    let content = state.try_get_slice::<Content>()?;
    Ok(Json(content.menus.list(&id).await?))
}

/// Public: menus are served unauthenticated for navigation widgets and
/// headless consumers.
#[api_handler(
    get,
    path = "/sites/{id}/menus/{key}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("key" = String, Path, description = "Menu key")
    ),
    responses((status = OK, description = "Menu by key", body = Menu)),
    tag = CONTENT_TAG
)]
pub(super) async fn get_menu(
    State(state): State<ApiState>,
    Path((id, key)): Path<(String, String)>,
) -> Result<Json<Menu>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let content = state.try_get_slice::<Content>()?;
    Ok(Json(content.menus.get(&id, &key).await?))
}

#[api_handler(
    put,
    path = "/sites/{id}/menus/{key}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("key" = String, Path, description = "Menu key")
    ),
    request_body = UpsertMenu,
    responses((status = OK, description = "Stored menu", body = Menu)),
    tag = CONTENT_TAG
)]
pub(super) async fn upsert_menu(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, key)): Path<(String, String)>,
    Json(req): Json<UpsertMenu>,
) -> Result<Json<Menu>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let content = state.try_get_slice::<Content>()?;
    let menu = content.menus.upsert(&id, &key, req).await?;
    state.notify_content_changed(ContentChanged::site_wide(&menu.site_id));
    info!(site = %menu.site_id, key = %menu.key, user = %user.id, "Menu stored");
    Ok(Json(menu))
}

#[api_handler(
    delete,
    path = "/sites/{id}/menus/{key}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("key" = String, Path, description = "Menu key")
    ),
    responses((status = NO_CONTENT, description = "Menu deleted")),
    tag = CONTENT_TAG
)]
pub(super) async fn delete_menu(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let content = state.try_get_slice::<Content>()?;
    let menu = content.menus.delete(&id, &key).await?;
    state.notify_content_changed(ContentChanged::site_wide(&menu.site_id));
    info!(site = %menu.site_id, key = %menu.key, user = %user.id, "Menu deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Public: the storefront reads layouts while assembling the chrome around
/// a page body.
#[api_handler(
    get,
    path = "/sites/{id}/layouts/{kind}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("kind" = String, Path, description = "`header` or `footer`")
    ),
    responses((status = OK, description = "Layout by kind", body = Layout)),
    tag = CONTENT_TAG
)]
pub(super) async fn get_layout(
    State(state): State<ApiState>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Json<Layout>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let kind = LayoutKind::parse(&kind)?;
    let content = state.try_get_slice::<Content>()?;
    Ok(Json(content.layouts.get(&id, kind).await?))
}

#[api_handler(
    put,
    path = "/sites/{id}/layouts/{kind}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("kind" = String, Path, description = "`header` or `footer`")
    ),
    request_body = UpsertLayout,
    responses((status = OK, description = "Stored layout", body = Layout)),
    tag = CONTENT_TAG
)]
pub(super) async fn upsert_layout(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, kind)): Path<(String, String)>,
    Json(req): Json<UpsertLayout>,
) -> Result<Json<Layout>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let kind = LayoutKind::parse(&kind)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let content = state.try_get_slice::<Content>()?;
    let layout = content.layouts.upsert(&id, kind, req).await?;
    state.notify_content_changed(ContentChanged::site_wide(&layout.site_id));
    info!(site = %layout.site_id, kind = %layout.kind, user = %user.id, "Layout stored");
    Ok(Json(layout))
}

#[api_handler(
    delete,
    path = "/sites/{id}/layouts/{kind}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("kind" = String, Path, description = "`header` or `footer`")
    ),
    responses((status = NO_CONTENT, description = "Layout deleted")),
    tag = CONTENT_TAG
)]
pub(super) async fn delete_layout(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, kind)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let kind = LayoutKind::parse(&kind)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Editor)?;

    let content = state.try_get_slice::<Content>()?;
    let layout = content.layouts.delete(&id, kind).await?;
    state.notify_content_changed(ContentChanged::site_wide(&layout.site_id));
    info!(site = %layout.site_id, kind = %layout.kind, user = %user.id, "Layout deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Loads the post and checks the caller's role in the site that owns it.
async fn post_for_role(
    state: &ApiState,
    user: &AuthUser,
    id: String,
    required: Role,
) -> Result<Post, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let content = state.try_get_slice::<Content>()?;
    let post = content.posts.get(&id).await?;
    RoleGuard::require(state.memberships.role(&user.id, &post.site_id).await?, required)?;
    Ok(post)
}
