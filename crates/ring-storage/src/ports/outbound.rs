//! # Driven Ports (SPI - Outbound)
//!
//! The delivery substrate a ring runs on.

use crate::domain::entities::NodeView;
use crate::domain::value_objects::NodeIndex;
use crate::errors::RelayError;
use crate::messages::NodeEnvelope;
use async_trait::async_trait;
use std::time::Duration;

/// One-way delivery between ring members.
///
/// ## Guarantees
///
/// - Delivery is asynchronous: `forward` returns once the message is queued.
/// - Messages from one sender to one recipient arrive in order.
/// - No ordering across different senders.
#[async_trait]
pub trait MessageRelay: Send + Sync {
    /// Queues `envelope` for `envelope.recipient`.
    async fn forward(&self, envelope: NodeEnvelope) -> Result<(), RelayError>;
}

/// Read access to the nodes a relay hosts. Never part of the protocol.
#[async_trait]
pub trait RingObserver: Send + Sync {
    /// Snapshot of node `index`.
    async fn view(&self, index: NodeIndex) -> NodeView;

    /// Waits until nothing is queued or being processed.
    async fn wait_idle(&self, limit: Duration) -> Result<(), RelayError>;
}
