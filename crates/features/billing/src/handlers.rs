//! HTTP surface for payment-provider configuration.
//!
//! Everything here needs the `payments.providers` feature (Pro tier baseline)
//! and an Admin role in the site. Responses are always the masked view; the
//! secret key goes in through the upsert payload and never comes back out.

use crate::Billing;
use crate::models::{PaymentConfig, PaymentProvider, UpsertPaymentConfig};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use fhub_derive::api_handler;
use fhub_domain::capabilities::{Role, Tier};
use fhub_domain::constants::{BILLING_TAG, PAYMENT_PROVIDERS, SITE};
use fhub_kernel::prelude::*;
use tracing::info;

#[api_handler(
    get,
    path = "/sites/{id}/payments",
    params(("id" = String, Path, description = "Site record id")),
    responses((status = OK, description = "Provider configs of the site", body = [PaymentConfig])),
    tag = BILLING_TAG
)]
pub(super) async fn list_payment_configs(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PaymentConfig>>, ApiError> {
    let id = admin_with_payments(&state, &user, id).await?;
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.payments.list(&id).await?))
}

#[api_handler(
    get,
    path = "/sites/{id}/payments/{provider}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("provider" = String, Path, description = "`stripe` or `paypal`")
    ),
    responses((status = OK, description = "Masked provider config", body = PaymentConfig)),
    tag = BILLING_TAG
)]
pub(super) async fn get_payment_config(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, provider)): Path<(String, String)>,
) -> Result<Json<PaymentConfig>, ApiError> {
    let provider = PaymentProvider::parse(&provider)?;
    let id = admin_with_payments(&state, &user, id).await?;
    let billing = state.try_get_slice::<Billing>()?;
    Ok(Json(billing.payments.get(&id, provider).await?))
}

#[api_handler(
    put,
    path = "/sites/{id}/payments/{provider}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("provider" = String, Path, description = "`stripe` or `paypal`")
    ),
    request_body = UpsertPaymentConfig,
    responses((status = OK, description = "Stored masked config", body = PaymentConfig)),
    tag = BILLING_TAG
)]
pub(super) async fn upsert_payment_config(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, provider)): Path<(String, String)>,
    Json(req): Json<UpsertPaymentConfig>,
) -> Result<Json<PaymentConfig>, ApiError> {
    let provider = PaymentProvider::parse(&provider)?;
    let id = admin_with_payments(&state, &user, id).await?;

    let billing = state.try_get_slice::<Billing>()?;
    let config = billing.payments.upsert(&id, provider, req, &billing.sealer).await?;
    info!(site = %id, provider = %config.provider, user = %user.id, "Payment config stored");
    Ok(Json(config))
}

#[api_handler(
    delete,
    path = "/sites/{id}/payments/{provider}",
    params(
        ("id" = String, Path, description = "Site record id"),
        ("provider" = String, Path, description = "`stripe` or `paypal`")
    ),
    responses((status = NO_CONTENT, description = "Provider config deleted")),
    tag = BILLING_TAG
)]
pub(super) async fn delete_payment_config(
    State(state): State<ApiState>,
    user: AuthUser,
    Path((id, provider)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let provider = PaymentProvider::parse(&provider)?;
    let id = admin_with_payments(&state, &user, id).await?;

    let billing = state.try_get_slice::<Billing>()?;
    let config = billing.payments.delete(&id, provider).await?;
    info!(site = %id, provider = %config.provider, user = %user.id, "Payment config deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Admin role plus the `payments.providers` feature, Pro tier baseline.
async fn admin_with_payments(
    state: &ApiState,
    user: &AuthUser,
    id: String,
) -> Result<String, ApiError> {
    let id = ResourceGuard::verify(id, SITE)?;
    RoleGuard::require(state.memberships.role(&user.id, &id).await?, Role::Admin)?;

    let access = state
        .sites
        .access(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Site `{id}` does not exist")))?;
    FeatureGuard::require(
        &access.features,
        access.tier,
        PAYMENT_PROVIDERS,
        Baseline::MinTier(Tier::Pro),
    )?;
    Ok(id)
}
