//! End-to-end serving tests against a stub platform API.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use fhub_content::models::{Layout, LayoutKind};
use fhub_domain::blocks::{Block, BlockKind, Container, PageTree, Section, Styles};
use fhub_domain::capabilities::Tier;
use fhub_domain::config::StorefrontConfig;
use fhub_domain::constants::{PREVIEW_COOKIE, REVALIDATE_HEADER};
use fhub_pages::models::RenderablePage;
use fhub_storefront::AppState;
use fhub_tenancy::models::Site;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const SITE_ID: &str = "site:demo";

#[derive(Clone, Default)]
struct Stub {
    published_hits: Arc<AtomicUsize>,
}

fn site() -> Site {
    Site {
        id: SITE_ID.to_owned(),
        name: "Demo".to_owned(),
        slug: "demo".to_owned(),
        hosts: vec!["127.0.0.1".to_owned()],
        tier: Tier::Pro,
        features: json!({}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn section(id: &str, copy: &str) -> Section {
    Section {
        id: id.to_owned(),
        label: None,
        anchor: None,
        styles: Styles::default(),
        containers: vec![Container {
            id: format!("{id}-inner"),
            styles: Styles::default(),
            blocks: vec![Block {
                id: format!("{id}-copy"),
                styles: Styles::default(),
                kind: BlockKind::Heading { text: copy.to_owned(), level: 2 },
            }],
        }],
    }
}

fn page(path: &str, title: &str, copy: &str) -> RenderablePage {
    RenderablePage {
        id: "page:demo-home".to_owned(),
        site_id: SITE_ID.to_owned(),
        slug: title.to_ascii_lowercase(),
        path: path.to_owned(),
        title: title.to_owned(),
        tree: PageTree { sections: vec![section("main", copy)] },
        seo: Value::Null,
    }
}

#[derive(Deserialize)]
struct HostQuery {
    host: String,
}

async fn resolve(Query(query): Query<HostQuery>) -> Response {
    if query.host == "127.0.0.1" {
        Json(site()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

#[derive(Deserialize)]
struct PathQuery {
    path: String,
}

async fn published(
    State(stub): State<Stub>,
    Path(site_id): Path<String>,
    Query(query): Query<PathQuery>,
) -> Response {
    assert_eq!(site_id, SITE_ID);
    stub.published_hits.fetch_add(1, Ordering::SeqCst);
    match query.path.as_str() {
        "/" => Json(page("/", "Home", "Welcome home")).into_response(),
        "/pricing" => Json(page("/pricing", "Pricing", "Simple pricing")).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
struct DraftQuery {
    path: String,
    token: String,
}

async fn draft(Path(_site): Path<String>, Query(query): Query<DraftQuery>) -> Response {
    if query.token == "tok-good" {
        Json(page(&query.path, "Draft", "Unpublished copy")).into_response()
    } else {
        StatusCode::FORBIDDEN.into_response()
    }
}

async fn layout(Path((_site, kind)): Path<(String, String)>) -> Response {
    if kind == LayoutKind::Header.as_str() {
        Json(Layout {
            site_id: SITE_ID.to_owned(),
            kind: LayoutKind::Header,
            sections: vec![section("site-header", "Demo nav")],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Minimal platform API stand-in serving one site with two pages and a
/// header layout.
async fn spawn_stub() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/sites/resolve", get(resolve))
        .route("/sites/{site_id}/pages/published", get(published))
        .route("/sites/{site_id}/pages/draft", get(draft))
        .route("/sites/{site_id}/layouts/{kind}", get(layout))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), stub)
}

async fn spawn_storefront(api_base: String) -> String {
    let mut cfg = StorefrontConfig::default();
    cfg.api.base_url = api_base;
    cfg.revalidate_key = "k-test".to_owned();
    let state = AppState::new(cfg).expect("state");
    let app = fhub_storefront::router::init(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn published_pages_are_composed_and_cached() {
    let (api, stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/")).send().await.expect("send");
    assert_eq!(response.status(), 200);
    let html = response.text().await.expect("body");
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains("Welcome home"));
    // The header layout is composed above the page's own sections.
    let nav = html.find("Demo nav").expect("nav");
    let copy = html.find("Welcome home").expect("copy");
    assert!(nav < copy);

    let again = client.get(format!("{base}/")).send().await.expect("send");
    assert_eq!(again.text().await.expect("body"), html);
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 1);

    // Trailing slashes normalize onto the same cached document.
    client.get(format!("{base}/pricing")).send().await.expect("send");
    client.get(format!("{base}/pricing/")).send().await.expect("send");
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_paths_and_hosts_get_the_not_found_page() {
    let (api, _stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;
    let client = reqwest::Client::new();

    let missing = client.get(format!("{base}/no-such-page")).send().await.expect("send");
    assert_eq!(missing.status(), 404);
    assert!(missing.text().await.expect("body").contains("404"));

    let foreign = client
        .get(format!("{base}/"))
        .header(reqwest::header::HOST, "unclaimed.test")
        .send()
        .await
        .expect("send");
    assert_eq!(foreign.status(), 404);
}

#[tokio::test]
async fn previews_bypass_the_cache_and_fall_back_when_rejected() {
    let (api, stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;
    let client = reqwest::Client::new();

    let preview = client
        .get(format!("{base}/"))
        .header(reqwest::header::COOKIE, format!("{PREVIEW_COOKIE}=tok-good"))
        .send()
        .await
        .expect("send");
    assert_eq!(preview.status(), 200);
    assert_eq!(
        preview.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    assert!(preview.text().await.expect("body").contains("Unpublished copy"));
    // Draft renders never touch the published pipeline.
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 0);

    let rejected = client
        .get(format!("{base}/"))
        .header(reqwest::header::COOKIE, format!("{PREVIEW_COOKIE}=tok-expired"))
        .send()
        .await
        .expect("send");
    assert_eq!(rejected.status(), 200);
    assert!(rejected.text().await.expect("body").contains("Welcome home"));
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn the_preview_link_sets_a_session_cookie_and_redirects() {
    let (api, _stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client");

    let response = client
        .get(format!("{base}/api/preview?token=tok-good&path=/pricing"))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/pricing")
    );
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("cookie");
    assert!(cookie.starts_with("fhub_preview=tok-good"));
    assert!(cookie.contains("HttpOnly"));

    let bad = client
        .get(format!("{base}/api/preview?token=tok-bogus&path=/pricing"))
        .send()
        .await
        .expect("send");
    assert_eq!(bad.status(), 404);
}

#[tokio::test]
async fn revalidation_purges_cached_documents() {
    let (api, stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;
    let client = reqwest::Client::new();

    for path in ["/", "/pricing"] {
        let warm = client.get(format!("{base}{path}")).send().await.expect("send");
        assert_eq!(warm.status(), 200);
    }
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 2);

    // A wrong key purges nothing.
    let denied = client
        .post(format!("{base}/api/revalidate"))
        .header(REVALIDATE_HEADER, "wrong")
        .json(&json!({ "siteId": SITE_ID, "paths": ["/pricing"] }))
        .send()
        .await
        .expect("send");
    assert_eq!(denied.status(), 401);

    let purge = client
        .post(format!("{base}/api/revalidate"))
        .header(REVALIDATE_HEADER, "k-test")
        .json(&json!({ "siteId": SITE_ID, "paths": ["/pricing"] }))
        .send()
        .await
        .expect("send");
    assert_eq!(purge.status(), 200);
    let summary: Value = purge.json().await.expect("json");
    assert_eq!(summary["purged"], 1);

    // "/" is still warm, "/pricing" renders fresh.
    client.get(format!("{base}/")).send().await.expect("send");
    client.get(format!("{base}/pricing")).send().await.expect("send");
    assert_eq!(stub.published_hits.load(Ordering::SeqCst), 3);

    // An event without paths clears the whole site.
    let wipe = client
        .post(format!("{base}/api/revalidate"))
        .header(REVALIDATE_HEADER, "k-test")
        .json(&json!({ "siteId": SITE_ID }))
        .send()
        .await
        .expect("send");
    let summary: Value = wipe.json().await.expect("json");
    assert_eq!(summary["purged"], 2);
}

#[tokio::test]
async fn an_unreachable_api_degrades_to_503() {
    // Allocate a port and immediately free it so connections are refused.
    let dead_api = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        format!("http://{addr}")
    };
    let base = spawn_storefront(dead_api).await;

    let response = reqwest::get(format!("{base}/")).await.expect("send");
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn health_answers_under_any_host() {
    let (api, _stub) = spawn_stub().await;
    let base = spawn_storefront(api).await;

    let response = reqwest::get(format!("{base}/healthz")).await.expect("send");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "ok");
}
