//! Route table for the storefront.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

/// Builds the complete storefront router: public page serving behind host
/// resolution, plus the preview, revalidation, and health endpoints.
pub fn init(state: AppState) -> Router {
    // Page serving and previews need a resolved site. Health and the
    // revalidation endpoint are reachable under any host.
    let site_scoped = Router::new()
        .route("/", get(handlers::serve_root))
        .route("/{*path}", get(handlers::serve_path))
        .route("/api/preview", get(handlers::preview))
        .layer(middleware::from_fn_with_state(state.clone(), handlers::resolve_host));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/revalidate", post(handlers::revalidate))
        .merge(site_scoped)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
