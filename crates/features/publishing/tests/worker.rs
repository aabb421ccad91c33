#![cfg(feature = "server")]

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use fhub_domain::config::{RevalidateTarget, RevalidationConfig};
use fhub_domain::constants::REVALIDATE_HEADER;
use fhub_domain::events::ContentChanged;
use fhub_event_bus::EventBus;
use fhub_publishing::worker::RevalidationWorker;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

type Delivery = (Option<String>, ContentChanged);

/// Minimal storefront stand-in recording every revalidation push.
async fn spawn_target() -> (String, mpsc::Receiver<Delivery>) {
    let (tx, rx) = mpsc::channel::<Delivery>(8);
    let app = Router::new().route("/api/revalidate", post(record)).with_state(tx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), rx)
}

async fn record(
    State(tx): State<mpsc::Sender<Delivery>>,
    headers: HeaderMap,
    Json(event): Json<ContentChanged>,
) -> StatusCode {
    let key = headers
        .get(REVALIDATE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    tx.send((key, event)).await.ok();
    StatusCode::OK
}

fn config(targets: Vec<RevalidateTarget>) -> RevalidationConfig {
    RevalidationConfig { enabled: true, targets, timeout_seconds: 2, queue_capacity: 16 }
}

fn target(base_url: String, key: &str) -> RevalidateTarget {
    RevalidateTarget { base_url, key: key.to_owned() }
}

#[tokio::test]
async fn delivers_queued_events_with_the_shared_key() {
    let (base_url, mut rx) = spawn_target().await;
    let events = EventBus::new();
    let worker = RevalidationWorker::spawn(&config(vec![target(base_url, "k-123")]), &events)
        .expect("spawn");
    assert!(worker.is_running());

    events
        .publish_mpsc(ContentChanged::paths("site:one", vec!["/pricing".to_owned()]))
        .expect("publish");
    let (key, event) =
        timeout(Duration::from_secs(5), rx.recv()).await.expect("delivery").expect("channel");
    assert_eq!(key.as_deref(), Some("k-123"));
    assert_eq!(event.site_id, "site:one");
    assert_eq!(event.paths, vec!["/pricing"]);

    events.publish_mpsc(ContentChanged::site_wide("site:one")).expect("publish");
    let (_, event) =
        timeout(Duration::from_secs(5), rx.recv()).await.expect("delivery").expect("channel");
    assert!(event.is_site_wide());
}

#[tokio::test]
async fn fans_out_to_every_target() {
    let (first_url, mut first_rx) = spawn_target().await;
    let (second_url, mut second_rx) = spawn_target().await;
    let events = EventBus::new();
    let targets = vec![target(first_url, "k-a"), target(second_url, "k-b")];
    let _worker = RevalidationWorker::spawn(&config(targets), &events).expect("spawn");

    events.publish_mpsc(ContentChanged::site_wide("site:one")).expect("publish");

    let (key, _) =
        timeout(Duration::from_secs(5), first_rx.recv()).await.expect("first").expect("channel");
    assert_eq!(key.as_deref(), Some("k-a"));
    let (key, _) = timeout(Duration::from_secs(5), second_rx.recv())
        .await
        .expect("second")
        .expect("channel");
    assert_eq!(key.as_deref(), Some("k-b"));
}

#[tokio::test]
async fn a_dead_target_does_not_stop_the_loop() {
    // Allocate a port and immediately free it so connections are refused.
    let dead_url = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        format!("http://{addr}")
    };
    let (live_url, mut rx) = spawn_target().await;
    let events = EventBus::new();
    let targets = vec![target(dead_url, "k-dead"), target(live_url, "k-live")];
    let _worker = RevalidationWorker::spawn(&config(targets), &events).expect("spawn");

    events.publish_mpsc(ContentChanged::site_wide("site:one")).expect("publish");
    events.publish_mpsc(ContentChanged::site_wide("site:two")).expect("publish");

    // Retries against the dead target delay but never drop the live pushes.
    let (_, event) =
        timeout(Duration::from_secs(10), rx.recv()).await.expect("first").expect("channel");
    assert_eq!(event.site_id, "site:one");
    let (_, event) =
        timeout(Duration::from_secs(10), rx.recv()).await.expect("second").expect("channel");
    assert_eq!(event.site_id, "site:two");
}

#[tokio::test]
async fn disabled_config_spawns_no_worker() {
    let events = EventBus::new();
    let config = RevalidationConfig { enabled: false, ..RevalidationConfig::default() };
    let worker = RevalidationWorker::spawn(&config, &events).expect("spawn");
    assert!(!worker.is_running());
}

#[tokio::test]
async fn the_queue_can_only_be_claimed_once() {
    let (base_url, _rx) = spawn_target().await;
    let events = EventBus::new();
    let cfg = config(vec![target(base_url, "k-123")]);

    let _first = RevalidationWorker::spawn(&cfg, &events).expect("spawn");
    let err = RevalidationWorker::spawn(&cfg, &events).unwrap_err();
    assert!(matches!(err, fhub_publishing::PublishingError::Bus { .. }));
}
