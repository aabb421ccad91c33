//! Storefront cache revalidation worker.
//!
//! A single task drains the content-changed queue and pushes each event to
//! every configured storefront endpoint. Delivery is best effort: a failed
//! push is retried a bounded number of times and then dropped with a warning.
//! Nothing here ever blocks the mutating request that queued the event.

use crate::error::{PublishingError, PublishingErrorExt};
use fhub_domain::config::{RevalidateTarget, RevalidationConfig};
use fhub_domain::constants::REVALIDATE_HEADER;
use fhub_domain::events::ContentChanged;
use fhub_event_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delivery attempts per target before an event is dropped.
const MAX_ATTEMPTS: u32 = 3;
/// Pause between attempts.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Handle on the spawned delivery loop.
#[derive(Debug, Clone, Default)]
pub struct RevalidationWorker {
    handle: Option<Arc<JoinHandle<()>>>,
}

impl RevalidationWorker {
    /// Claims the content-changed queue and spawns the delivery loop. With
    /// revalidation disabled no worker is spawned and queued events stay with
    /// the bus.
    ///
    /// # Errors
    /// [`PublishingError::Bus`] when the queue is already claimed,
    /// [`PublishingError::Http`] when the outbound client cannot be built.
    pub fn spawn(
        config: &RevalidationConfig,
        events: &EventBus,
    ) -> Result<Self, PublishingError> {
        if !config.enabled {
            info!("Revalidation disabled; content changes will not reach storefronts");
            return Ok(Self::default());
        }

        let queue = events
            .subscribe_mpsc::<ContentChanged>(config.queue_capacity)
            .context("Claiming the content-changed queue")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Building the revalidation client")?;
        let targets = config.targets.clone();

        info!(targets = targets.len(), "Revalidation worker started");
        let handle = tokio::spawn(deliver_loop(queue, client, targets));
        Ok(Self { handle: Some(Arc::new(handle)) })
    }

    /// Whether the delivery loop is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

/// Runs until the bus shuts down and the queue drains.
async fn deliver_loop(
    mut queue: mpsc::Receiver<Arc<ContentChanged>>,
    client: reqwest::Client,
    targets: Vec<RevalidateTarget>,
) {
    while let Some(event) = queue.recv().await {
        for target in &targets {
            deliver(&client, target, &event).await;
        }
    }
    debug!("Revalidation worker stopped");
}

async fn deliver(client: &reqwest::Client, target: &RevalidateTarget, event: &ContentChanged) {
    let url = format!("{}/api/revalidate", target.base_url.trim_end_matches('/'));
    for attempt in 1..=MAX_ATTEMPTS {
        match push(client, &url, &target.key, event).await {
            Ok(()) => {
                debug!(site = %event.site_id, target = %target.base_url, "Revalidated");
                return;
            }
            Err(err) if attempt < MAX_ATTEMPTS => {
                debug!(%err, attempt, target = %target.base_url, "Revalidation attempt failed");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => {
                warn!(
                    %err,
                    site = %event.site_id,
                    target = %target.base_url,
                    "Revalidation dropped"
                );
            }
        }
    }
}

async fn push(
    client: &reqwest::Client,
    url: &str,
    key: &str,
    event: &ContentChanged,
) -> Result<(), reqwest::Error> {
    client
        .post(url)
        .header(REVALIDATE_HEADER, key)
        .json(event)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
