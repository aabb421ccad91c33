//! Route table for the billing slice.

use crate::handlers;
use fhub_kernel::server::state::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Payment-provider configuration endpoints.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list_payment_configs))
        .routes(routes!(
            handlers::get_payment_config,
            handlers::upsert_payment_config,
            handlers::delete_payment_config
        ))
}
