//! Host-scoped request handling.
//!
//! Every page route runs behind [`resolve_host`], which turns the HTTP
//! `Host` header into a [`Site`] and stashes it in the request extensions.
//! Rendered documents are cached per `(site, path)` until a revalidation
//! call evicts them.

use crate::error::StorefrontError;
use crate::render;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, Request, State};
use axum::http::header::{CACHE_CONTROL, COOKIE, HOST, PRAGMA, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use fhub_content::models::LayoutKind;
use fhub_domain::constants::{PREVIEW_COOKIE, REVALIDATE_HEADER};
use fhub_domain::events::ContentChanged;
use fhub_pages::models::normalize_path;
use fhub_tenancy::models::Site;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info};

/// Maps the request's `Host` header to a site and injects it as an
/// extension. Unknown hosts get the storefront's not-found page, and an
/// unreachable platform API degrades to a 503 instead of an error page
/// per request.
pub(crate) async fn resolve_host(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(host) = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(bare_host)
    else {
        debug!("Request without a usable Host header");
        return not_found();
    };

    match site_for(&state, &host).await {
        Ok(Some(site)) => {
            request.extensions_mut().insert(site);
            next.run(request).await
        }
        Ok(None) => {
            debug!(host, "No site claims this host");
            not_found()
        }
        Err(err) => {
            error!(error = %err, host, "Site resolution failed");
            unavailable()
        }
    }
}

async fn site_for(state: &AppState, host: &str) -> Result<Option<Arc<Site>>, StorefrontError> {
    if let Some(site) = state.sites.get(host) {
        return Ok(Some(site));
    }
    let Some(site) = state.api.resolve_site(host).await? else {
        return Ok(None);
    };
    let site = Arc::new(site);
    state.sites.insert(host, site.clone());
    Ok(Some(site))
}

/// Lowercases a `Host` header and strips any port, keeping bracketed
/// IPv6 literals intact.
fn bare_host(raw: &str) -> String {
    let host = raw.trim().to_ascii_lowercase();
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((inside, _)) = rest.split_once(']') {
            return format!("[{inside}]");
        }
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name.to_owned()
        }
        _ => host,
    }
}

pub(crate) async fn serve_root(
    State(state): State<AppState>,
    Extension(site): Extension<Arc<Site>>,
    headers: HeaderMap,
) -> Response {
    page_response(&state, &site, &headers, "/").await
}

pub(crate) async fn serve_path(
    State(state): State<AppState>,
    Extension(site): Extension<Arc<Site>>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Response {
    let path = normalize_path(&path);
    page_response(&state, &site, &headers, &path).await
}

async fn page_response(
    state: &AppState,
    site: &Arc<Site>,
    headers: &HeaderMap,
    path: &str,
) -> Response {
    if let Some(token) = preview_token(headers) {
        match draft_response(state, site, path, &token).await {
            Ok(response) => return response,
            Err(err) => {
                debug!(
                    error = %err,
                    site = %site.id,
                    path,
                    "Preview cookie rejected; serving the published page"
                );
            }
        }
    }
    published_response(state, site, path).await
}

/// A draft render goes straight to the API on every request: no cache
/// reads, no cache writes, and a `no-store` header so nothing between
/// the editor and the storefront keeps a copy either.
async fn draft_response(
    state: &AppState,
    site: &Site,
    path: &str,
    token: &str,
) -> Result<Response, StorefrontError> {
    let page = state.api.draft_page(&site.id, path, token).await?;
    let (header, footer) = tokio::join!(
        state.api.layout(&site.id, LayoutKind::Header),
        state.api.layout(&site.id, LayoutKind::Footer),
    );
    let rendered =
        render::compose(&state.registry, site, &page, header?.as_ref(), footer?.as_ref());
    Ok(([(CACHE_CONTROL, "no-store")], Html(rendered.html)).into_response())
}

async fn published_response(state: &AppState, site: &Site, path: &str) -> Response {
    if let Some(bytes) = state.pages.get(&site.id, path) {
        return Html(bytes).into_response();
    }

    match published_bundle(state, site, path).await {
        Ok(Some(bytes)) => Html(bytes).into_response(),
        Ok(None) => not_found(),
        Err(err) => {
            error!(error = %err, site = %site.id, path, "Failed to assemble the page");
            unavailable()
        }
    }
}

/// Fetches, renders, and caches one published document.
async fn published_bundle(
    state: &AppState,
    site: &Site,
    path: &str,
) -> Result<Option<Bytes>, StorefrontError> {
    let Some(page) = state.api.published_page(&site.id, path).await? else {
        return Ok(None);
    };
    let (header, footer) = tokio::join!(
        state.api.layout(&site.id, LayoutKind::Header),
        state.api.layout(&site.id, LayoutKind::Footer),
    );
    let rendered =
        render::compose(&state.registry, site, &page, header?.as_ref(), footer?.as_ref());
    let bytes = Bytes::from(rendered.html);
    state.pages.insert(&site.id, path, bytes.clone());
    Ok(Some(bytes))
}

fn preview_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == PREVIEW_COOKIE && !value.is_empty()).then(|| value.to_owned())
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewQuery {
    token: String,
    #[serde(default = "default_preview_path")]
    path: String,
}

fn default_preview_path() -> String {
    "/".to_owned()
}

/// Entry point for editor preview links. The token is checked against the
/// draft endpoint before anything is stored; a good one becomes a session
/// cookie so navigation within the site stays in preview mode.
pub(crate) async fn preview(
    State(state): State<AppState>,
    Extension(site): Extension<Arc<Site>>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let path = normalize_path(&query.path);
    match state.api.draft_page(&site.id, &path, &query.token).await {
        Ok(page) => {
            info!(site = %site.id, page = %page.id, "Preview session opened");
            let cookie =
                format!("{PREVIEW_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", query.token);
            ([(SET_COOKIE, cookie)], Redirect::to(&path)).into_response()
        }
        Err(err) => {
            debug!(error = %err, site = %site.id, "Preview token rejected");
            not_found()
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RevalidateSummary {
    purged: u64,
}

/// Cache eviction endpoint, called by the platform's revalidation worker.
/// The shared key is compared in constant time; an event without paths
/// clears the whole site.
pub(crate) async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<ContentChanged>,
) -> Response {
    let presented = headers
        .get(REVALIDATE_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();
    if !bool::from(presented.ct_eq(state.config.revalidate_key.as_bytes())) {
        debug!(site = %event.site_id, "Revalidation request with a bad key");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let purged = if event.is_site_wide() {
        state.pages.purge_site(&event.site_id)
    } else {
        let paths: Vec<String> = event.paths().iter().map(|path| normalize_path(path)).collect();
        state.pages.purge_paths(&event.site_id, &paths)
    };
    info!(site = %event.site_id, purged, "Cache revalidated");
    Json(RevalidateSummary { purged }).into_response()
}

pub(crate) async fn healthz() -> impl IntoResponse {
    (
        [
            (CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (PRAGMA, "no-cache"),
        ],
        "ok",
    )
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response()
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Html(render::unavailable_page())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ports_and_case_are_stripped_from_hosts() {
        assert_eq!(bare_host("Shop.Example.COM:8443"), "shop.example.com");
        assert_eq!(bare_host(" example.com "), "example.com");
        assert_eq!(bare_host("[::1]:4461"), "[::1]");
        assert_eq!(bare_host("intra:net"), "intra:net");
    }

    #[test]
    fn preview_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; fhub_preview=tok.en.sig; _ga=1"),
        );
        assert_eq!(preview_token(&headers), Some("tok.en.sig".to_owned()));

        let mut bare = HeaderMap::new();
        bare.insert(COOKIE, HeaderValue::from_static("fhub_preview="));
        assert_eq!(preview_token(&bare), None);
    }
}
