//! # Owner Gate
//!
//! Decides whether a sender may drive a node.
//!
//! The owner may reach any node directly. Every other node accepts messages
//! only from its predecessor sibling, which it can recognize by address alone;
//! it never re-checks who started the sweep.

use super::entities::{Node, RingConfig};
use super::value_objects::{Address, Delivery};
use crate::errors::RingError;

/// Authorization checks for one ring.
#[derive(Debug, Clone, Copy)]
pub struct OwnerGate<'a> {
    config: &'a RingConfig,
}

impl<'a> OwnerGate<'a> {
    /// Creates a gate for `config`.
    #[must_use]
    pub const fn new(config: &'a RingConfig) -> Self {
        Self { config }
    }

    /// Owner of `node`: the recorded owner once materialized, the ring owner
    /// before that.
    #[must_use]
    pub fn owner_of(&self, node: &Node) -> Address {
        node.owner().unwrap_or(self.config.owner)
    }

    /// Returns true if `requester` may originate an operation at `node`.
    #[must_use]
    pub fn authorize(&self, requester: Address, node: &Node) -> bool {
        requester == self.owner_of(node)
    }

    /// Returns true if `sender` is the predecessor sibling of `node`.
    #[must_use]
    pub fn authorize_forward(&self, sender: Address, node: &Node) -> bool {
        self.config
            .predecessor(node.index())
            .is_some_and(|prev| sender == self.config.node_address(prev))
    }

    /// Classifies a ring-wide message, rejecting anyone else.
    pub fn classify(&self, sender: Address, node: &Node) -> Result<Delivery, RingError> {
        if self.authorize(sender, node) {
            Ok(Delivery::Direct)
        } else if self.authorize_forward(sender, node) {
            Ok(Delivery::Transitive)
        } else {
            Err(self.unauthorized(sender, node))
        }
    }

    /// Owner-only check for node-local requests.
    pub fn require_owner(&self, sender: Address, node: &Node) -> Result<(), RingError> {
        if self.authorize(sender, node) {
            Ok(())
        } else {
            Err(self.unauthorized(sender, node))
        }
    }

    fn unauthorized(&self, requester: Address, node: &Node) -> RingError {
        RingError::Unauthorized {
            requester,
            owner: self.owner_of(node),
        }
    }
}
