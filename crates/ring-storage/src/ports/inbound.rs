//! # Driving Port (API - Inbound)
//!
//! What an operator can do with a ring.

use crate::domain::entities::NodeView;
use crate::domain::value_objects::{Address, NodeIndex};
use crate::errors::RelayError;
use crate::messages::{ControlMessage, StoreRequest};
use async_trait::async_trait;
use uuid::Uuid;

/// Operator-facing ring API.
///
/// Originations return as soon as the first message is queued. A sweep has
/// no single acknowledgment; read the nodes back with
/// [`RingApi::lifecycle_view`] to find out what happened.
#[async_trait]
pub trait RingApi: Send + Sync {
    /// Sends a control message from `requester` to node `index`.
    ///
    /// Returns the sweep id that every hop and event will carry.
    async fn originate(
        &self,
        requester: Address,
        index: NodeIndex,
        message: ControlMessage,
    ) -> Result<Uuid, RelayError>;

    /// Sends a payload write from `requester` to node `index`.
    async fn store(
        &self,
        requester: Address,
        index: NodeIndex,
        request: StoreRequest,
    ) -> Result<(), RelayError>;

    /// Snapshot of node `index`. Never-contacted nodes read as uninitialized.
    async fn lifecycle_view(&self, index: NodeIndex) -> NodeView;

    /// Address of node `index`, computable without contacting anything.
    fn node_address(&self, index: NodeIndex) -> Address;
}
