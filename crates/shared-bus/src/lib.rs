//! # Shared Bus - Ring Event Bus
//!
//! Broadcast bus over which ring nodes report what happened to them.
//!
//! Nodes never wait on the bus and the protocol never reads from it: a sweep
//! is driven purely by node-to-node forwarding. The bus only gives operators
//! and tests a window onto the sweep as it passes.
//!
//! ```text
//! ┌──────────┐  publish()   ┌──────────────┐  subscribe()  ┌───────────┐
//! │ node(i)  │ ───────────→ │  Event Bus   │ ────────────→ │ operator  │
//! └──────────┘              └──────────────┘               └───────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, RingEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
