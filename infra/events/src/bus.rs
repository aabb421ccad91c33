use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

/// A safe default for channel buffers.
/// 128 absorbs a publish burst from a bulk content import without
/// stalling the publisher.
const DEFAULT_CAPACITY: usize = 128;
const MIN_CAPACITY: usize = 1;

/// Supported channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Fan-out semantics: every subscriber observes every event.
    Broadcast { capacity: usize },
    /// Queue semantics: a single consumer drains events in order.
    Mpsc { capacity: usize },
}

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

struct ChannelState {
    kind: ChannelKind,
    slot: Box<dyn Any + Send + Sync>,
}

struct FanOut<T> {
    sender: broadcast::Sender<Arc<T>>,
}

/// The receiver lives here until the single consumer claims it.
struct Queue<T> {
    sender: mpsc::Sender<Arc<T>>,
    receiver: Option<mpsc::Receiver<Arc<T>>>,
}

/// A high-performance, thread-safe Event Bus.
///
/// Manages channels indexed by [`TypeId`] of the event.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, ChannelState>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("channels", &self.channels.read().len()).finish()
    }
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to an event of type `T` using broadcast with default capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct PagePublished(u64);
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe::<PagePublished>()?;
    /// bus.publish(PagePublished(1))?;
    /// assert_eq!(rx.recv().await.unwrap().0, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes to an event of type `T` with a specific broadcast buffer capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`, or [`EventBusError::InvalidCapacity`] if
    /// `capacity` is zero.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct CacheSweep(u64);
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let _rx = bus.subscribe_with_capacity::<CacheSweep>(16)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        Ok(self.broadcast_sender::<T>(capacity)?.subscribe())
    }

    /// Subscribe to a bounded MPSC channel (queue semantics).
    ///
    /// The receiver can be claimed exactly once per event type; workers that
    /// drain a queue own its consumer side for the process lifetime.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`, [`EventBusError::ReceiverTaken`] if the
    /// receiver was already claimed, or [`EventBusError::InvalidCapacity`] if
    /// `capacity` is zero.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct RevalidateJob(u64);
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let _rx = bus.subscribe_mpsc::<RevalidateJob>(8)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe_mpsc<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Arc<T>>, EventBusError> {
        self.with_queue::<T, _>(capacity, |queue| {
            queue.receiver.take().ok_or_else(|| EventBusError::ReceiverTaken {
                message: "MPSC receiver already claimed".into(),
                context: Some(type_name::<T>().into()),
            })
        })
    }

    /// Publishes an event via broadcast, returning the number of subscribers
    /// that received it.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct Ping;
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.publish(Ping)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes a shared event instance via broadcast without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    /// use std::sync::Arc;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct Ping;
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.publish_arc(Arc::new(Ping))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let sender = self.broadcast_sender::<T>(DEFAULT_CAPACITY)?;
        match sender.send(event) {
            Ok(count) => {
                trace!(event = type_name::<T>(), count, "Event dispatched");
                Ok(count)
            },
            Err(_) => {
                trace!(event = type_name::<T>(), "Event dropped: no active subscribers");
                Ok(0)
            },
        }
    }

    /// Publishes to a bounded MPSC channel (queue semantics).
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`, or [`EventBusError::ChannelFull`] if full.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct RevalidateJob(u64);
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let rx = bus.subscribe_mpsc::<RevalidateJob>(8)?;
    /// bus.publish_mpsc(RevalidateJob(1))?;
    /// drop(rx);
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish_mpsc<T: Event>(&self, event: T) -> Result<(), EventBusError> {
        self.publish_mpsc_arc(Arc::new(event))
    }

    /// Publishes to a bounded MPSC channel without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if a different channel kind
    /// was already registered for `T`, or [`EventBusError::ChannelFull`] if full.
    ///
    /// # Examples
    /// ```rust
    /// use fhub_event_bus::EventBus;
    /// use std::sync::Arc;
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct RevalidateJob(u64);
    ///
    /// # fn main() -> Result<(), fhub_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let rx = bus.subscribe_mpsc::<RevalidateJob>(8)?;
    /// bus.publish_mpsc_arc(Arc::new(RevalidateJob(1)))?;
    /// drop(rx);
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish_mpsc_arc<T: Event>(&self, event: Arc<T>) -> Result<(), EventBusError> {
        let sender = self.with_queue::<T, _>(DEFAULT_CAPACITY, |queue| Ok(queue.sender.clone()))?;
        sender.try_send(event).map_err(|err| EventBusError::ChannelFull {
            message: err.to_string().into(),
            context: Some(type_name::<T>().into()),
        })
    }

    /// Gracefully shuts down the bus by dropping all underlying channels.
    ///
    /// Returns the number of event channels that were closed.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn broadcast_sender<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        let capacity = validate_capacity(capacity)?;
        let id = TypeId::of::<T>();

        {
            let channels = self.channels.read();
            if let Some(state) = channels.get(&id) {
                return fan_out_sender::<T>(state, capacity);
            }
        }

        let mut channels = self.channels.write();
        match channels.entry(id) {
            Entry::Occupied(entry) => fan_out_sender::<T>(entry.get(), capacity),
            Entry::Vacant(entry) => {
                trace!(event = type_name::<T>(), capacity, "Initializing broadcast event channel");
                let (tx, _) = broadcast::channel::<Arc<T>>(capacity);
                entry.insert(ChannelState {
                    kind: ChannelKind::Broadcast { capacity },
                    slot: Box::new(FanOut { sender: tx.clone() }),
                });
                Ok(tx)
            },
        }
    }

    fn with_queue<T: Event, R>(
        &self,
        capacity: usize,
        access: impl FnOnce(&mut Queue<T>) -> Result<R, EventBusError>,
    ) -> Result<R, EventBusError> {
        let capacity = validate_capacity(capacity)?;
        let id = TypeId::of::<T>();

        let mut channels = self.channels.write();
        match channels.entry(id) {
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();
                let ChannelKind::Mpsc { capacity: existing } = state.kind else {
                    return Err(kind_mismatch::<T>(ChannelKind::Mpsc { capacity }, state.kind));
                };
                if existing != capacity {
                    warn!(
                        event = type_name::<T>(),
                        existing_capacity = existing,
                        requested_capacity = capacity,
                        "MPSC channel already initialized with a different capacity"
                    );
                }
                let queue =
                    state.slot.downcast_mut::<Queue<T>>().ok_or_else(payload_mismatch::<T>)?;
                access(queue)
            },
            Entry::Vacant(entry) => {
                trace!(event = type_name::<T>(), capacity, "Initializing MPSC event channel");
                let (tx, rx) = mpsc::channel::<Arc<T>>(capacity);
                let state = entry.insert(ChannelState {
                    kind: ChannelKind::Mpsc { capacity },
                    slot: Box::new(Queue { sender: tx, receiver: Some(rx) }),
                });
                let queue =
                    state.slot.downcast_mut::<Queue<T>>().ok_or_else(payload_mismatch::<T>)?;
                access(queue)
            },
        }
    }
}

fn fan_out_sender<T: Event>(
    state: &ChannelState,
    requested: usize,
) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
    let ChannelKind::Broadcast { capacity: existing } = state.kind else {
        return Err(kind_mismatch::<T>(ChannelKind::Broadcast { capacity: requested }, state.kind));
    };
    if existing != requested {
        warn!(
            event = type_name::<T>(),
            existing_capacity = existing,
            requested_capacity = requested,
            "Broadcast channel already initialized with a different capacity"
        );
    }
    let fan_out = state.slot.downcast_ref::<FanOut<T>>().ok_or_else(payload_mismatch::<T>)?;
    Ok(fan_out.sender.clone())
}

fn kind_mismatch<T>(requested: ChannelKind, found: ChannelKind) -> EventBusError {
    EventBusError::ChannelKindMismatch {
        message: format!("Expected {requested:?} but found {found:?} for {}", type_name::<T>())
            .into(),
        context: None,
    }
}

fn payload_mismatch<T>() -> EventBusError {
    EventBusError::TypeMismatch {
        message: type_name::<T>().into(),
        context: Some("Unexpected payload type for registered channel".into()),
    }
}

fn validate_capacity(capacity: usize) -> Result<usize, EventBusError> {
    if capacity < MIN_CAPACITY {
        return Err(EventBusError::InvalidCapacity {
            message: format!("capacity must be >= {MIN_CAPACITY}").into(),
            context: None,
        });
    }
    Ok(capacity)
}
