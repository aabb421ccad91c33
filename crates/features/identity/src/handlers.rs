//! HTTP surface for users, memberships and the Clerk webhook.

use crate::Identity;
use crate::models::{AssignRole, CreateUser, Member, UpdateUser, User};
use crate::webhook::{ClerkDeleted, ClerkEvent, ClerkUser, HEADER_ID, HEADER_SIGNATURE,
    HEADER_TIMESTAMP};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use fhub_derive::api_handler;
use fhub_domain::capabilities::Role;
use fhub_domain::constants::{IDENTITY_TAG, SITE, USER};
use fhub_kernel::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub(super) struct ExternalQuery {
    /// Provider-side user id, e.g. a Clerk `user_…` id.
    external_id: String,
}

#[api_handler(
    post,
    path = "/users",
    request_body = CreateUser,
    responses((status = CREATED, description = "User created", body = User)),
    tag = IDENTITY_TAG
)]
pub(super) async fn create_user(
    State(state): State<ApiState>,
    caller: AuthUser,
    Json(req): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    let user = identity.users.create(req).await?;
    info!(user = %user.id, caller = %caller.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[api_handler(
    get,
    path = "/users",
    params(ExternalQuery),
    responses((status = OK, description = "User by external id", body = User)),
    tag = IDENTITY_TAG
)]
pub(super) async fn lookup_user(
    State(state): State<ApiState>,
    _caller: AuthUser,
    Query(query): Query<ExternalQuery>,
) -> Result<Json<User>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    let user = identity.users.find_by_external(&query.external_id).await?;
    user.map(Json).ok_or_else(|| {
        ApiError::not_found(format!("No user with external id `{}`", query.external_id))
    })
}

#[api_handler(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    responses((status = OK, description = "User by id", body = User)),
    tag = IDENTITY_TAG
)]
pub(super) async fn get_user(
    State(state): State<ApiState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = ResourceGuard::verify(id, USER)?;
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.users.get(&id).await?))
}

#[api_handler(
    patch,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    request_body = UpdateUser,
    responses((status = OK, description = "Updated user", body = User)),
    tag = IDENTITY_TAG
)]
pub(super) async fn update_user(
    State(state): State<ApiState>,
    _caller: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    let id = ResourceGuard::verify(id, USER)?;
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.users.update(&id, patch).await?))
}

#[api_handler(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User record id")),
    responses((status = NO_CONTENT, description = "User deleted")),
    tag = IDENTITY_TAG
)]
pub(super) async fn delete_user(
    State(state): State<ApiState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, USER)?;
    let identity = state.try_get_slice::<Identity>()?;
    let (user, sites) = identity.users.delete(&id).await?;
    for site in &sites {
        state.memberships.invalidate(&user.id, site);
    }
    info!(user = %user.id, caller = %caller.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    get,
    path = "/sites/{id}/members",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = OK, description = "Members of the site", body = [Member])),
    tag = IDENTITY_TAG
)]
pub(super) async fn list_members(
    State(state): State<ApiState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Member>>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&caller.id, &id).await?, Role::Viewer)?;

    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.users.list_members(&id).await?))
}

/// Grants or changes a member's role. Admins manage the roster, but any
/// change that involves the Owner role, granting it or touching a current
/// Owner, takes an Owner caller.
#[api_handler(
    put,
    path = "/sites/{id}/members/{user_id}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("user_id" = String, Path, description = "User record id")
    ),
    request_body = AssignRole,
    responses((status = OK, description = "Membership after the change", body = Member)),
    tag = IDENTITY_TAG
)]
pub(super) async fn assign_role(
    State(state): State<ApiState>,
    caller: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
    Json(req): Json<AssignRole>,
) -> Result<Json<Member>, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let user_id = ResourceGuard::verify(user_id, USER)?;
    let caller_role = state.memberships.role(&caller.id, &id).await?;
    RoleGuard::require(caller_role, Role::Admin)?;

    let identity = state.try_get_slice::<Identity>()?;
    let current = identity.users.membership_role(&id, &user_id).await?;
    if req.role == Role::Owner || current == Some(Role::Owner) {
        RoleGuard::require(caller_role, Role::Owner)?;
    }

    let member = identity.users.upsert_membership(&id, &user_id, req.role).await?;
    state.memberships.invalidate(&user_id, &id);
    info!(site = %id, user = %user_id, role = req.role.as_str(), caller = %caller.id,
        "Role assigned");
    Ok(Json(member))
}

#[api_handler(
    delete,
    path = "/sites/{id}/members/{user_id}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("user_id" = String, Path, description = "User record id")
    ),
    responses((status = NO_CONTENT, description = "Membership revoked")),
    tag = IDENTITY_TAG
)]
pub(super) async fn remove_member(
    State(state): State<ApiState>,
    caller: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    let user_id = ResourceGuard::verify(user_id, USER)?;
    let caller_role = state.memberships.role(&caller.id, &id).await?;
    RoleGuard::require(caller_role, Role::Admin)?;

    let identity = state.try_get_slice::<Identity>()?;
    if identity.users.membership_role(&id, &user_id).await? == Some(Role::Owner) {
        RoleGuard::require(caller_role, Role::Owner)?;
    }

    identity.users.remove_membership(&id, &user_id).await?;
    state.memberships.invalidate(&user_id, &id);
    info!(site = %id, user = %user_id, caller = %caller.id, "Membership revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// Signed provider callback; the only unauthenticated mutation path.
#[api_handler(
    post,
    path = "/webhooks/clerk",
    request_body(content = String, description = "Raw signed event payload"),
    responses((status = NO_CONTENT, description = "Event processed or ignored")),
    tag = IDENTITY_TAG
)]
pub(super) async fn clerk_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;

    let id = require_header(&headers, HEADER_ID)?;
    let timestamp = require_header(&headers, HEADER_TIMESTAMP)?;
    let signatures = require_header(&headers, HEADER_SIGNATURE)?;
    identity.verifier.verify(id, timestamp, signatures, &body, Utc::now().timestamp())?;

    let event: ClerkEvent = serde_json::from_slice(&body).map_err(bad_payload)?;
    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let payload: ClerkUser = serde_json::from_value(event.data).map_err(bad_payload)?;
            let user = identity.users.upsert_external(payload.into_mirrored()?).await?;
            info!(user = %user.id, kind = %event.kind, "Webhook user mirrored");
        }
        "user.deleted" => {
            let payload: ClerkDeleted = serde_json::from_value(event.data).map_err(bad_payload)?;
            match identity.users.delete_external(&payload.id).await? {
                Some((user, sites)) => {
                    for site in &sites {
                        state.memberships.invalidate(&user.id, site);
                    }
                    info!(user = %user.id, "Webhook user removed");
                }
                None => debug!(external = %payload.id, "Webhook delete for unknown user"),
            }
        }
        other => debug!(kind = other, "Webhook event ignored"),
    }
    Ok(StatusCode::NO_CONTENT)
}

fn require_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers.get(name).and_then(|value| value.to_str().ok()).ok_or_else(|| {
        ApiError::Unauthorized {
            message: format!("Missing `{name}` header").into(),
            context: None,
        }
    })
}

fn bad_payload(err: serde_json::Error) -> ApiError {
    ApiError::Validation {
        message: format!("Webhook payload rejected: {err}").into(),
        context: None,
    }
}
