//! # Event Bus
//!
//! A type-safe, asynchronous event bus connecting feature slices without
//! direct dependencies between them.
//!
//! ## Overview
//!
//! Provides a centralized `EventBus` with two channel kinds: `broadcast` for
//! fan-out notifications and `mpsc` for single-consumer work queues. Uses
//! `tokio` primitives with minimal overhead.
//!
//! Typical flow: a slice publishes a content-changed event after a write,
//! and the revalidation worker drains those events from an MPSC queue to
//! refresh downstream caches.
//!
//! ## Features
//!
//! * **Type-Safe**: Events are identified by their Rust type.
//! * **Channel choice**: Broadcast (fan-out) or MPSC (queue).
//! * **High Performance**: `FxHashMap` + `parking_lot::RwLock`.
//! * **Async Ready**: Built on top of `tokio`.
//! * **Vertical Slice Friendly**: Share a single bus across slices.
//!
//! # Example
//!
//! ```rust
//! use fhub_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct PagePublished { path: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     // Default broadcast channel.
//!     let mut rx = bus.subscribe::<PagePublished>()?;
//!     bus.publish(PagePublished { path: "/pricing".into() })?;
//!
//!     if let Some(event) = rx.recv_event().await {
//!         assert_eq!(event.path, "/pricing");
//!     }
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{ChannelKind, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
