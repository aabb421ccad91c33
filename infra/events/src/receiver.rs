use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// An extension trait for event receivers to provide a more ergonomic API.
///
/// For `broadcast::Receiver`, `recv` absorbs lag errors instead of surfacing
/// them: slow subscribers resume from the oldest retained event.
pub trait EventReceiverExt<T> {
    /// Receive the next event, returning `None` when the channel is closed.
    fn recv(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;

    /// Receive the next event, returning `None` when the channel is closed.
    ///
    /// This is a convenience alias for [`EventReceiverExt::recv`]. Prefer it
    /// on `broadcast::Receiver`, where the inherent `recv` would otherwise
    /// shadow the trait method.
    fn recv_event(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send {
        self.recv()
    }
}

impl<T: Event> EventReceiverExt<T> for broadcast::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        let mut skipped = 0u64;

        loop {
            match self.recv().await {
                Ok(event) => {
                    if skipped > 0 {
                        warn!(
                            event = std::any::type_name::<T>(),
                            skipped,
                            "Event bus receiver lagged; resuming from oldest retained event"
                        );
                    }
                    return Some(event);
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    skipped = skipped.saturating_add(n);
                    debug!(
                        event = std::any::type_name::<T>(),
                        skipped = n,
                        total_skipped = skipped,
                        "Event bus receiver lagged; accumulating skipped events"
                    );
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl<T: Event> EventReceiverExt<T> for mpsc::Receiver<Arc<T>> {
    async fn recv(&mut self) -> Option<Arc<T>> {
        self.recv().await
    }
}
