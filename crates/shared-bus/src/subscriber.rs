//! # Event Subscriber
//!
//! Receiving side of the event bus.

use crate::events::{EventFilter, RingEvent};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// A subscription handle for receiving events.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<RingEvent>,

    /// Filter for this subscription.
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<RingEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<RingEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Waits for the event that ends `sweep_id`, either
    /// [`RingEvent::SweepCompleted`] or [`RingEvent::SweepHalted`].
    ///
    /// Matching events of other sweeps are consumed and dropped. Returns
    /// `None` if the bus closes first.
    pub async fn sweep_end(&mut self, sweep_id: Uuid) -> Option<RingEvent> {
        while let Some(event) = self.recv().await {
            if event.is_sweep_end() && event.sweep_id() == Some(sweep_id) {
                return Some(event);
            }
        }
        None
    }
}
