//! # Domain Entities
//!
//! The ring root configuration and the nodes it anchors.

use super::fees::CostSchedule;
use super::payload::Payload;
use super::services::derive_node_address;
use super::value_objects::{Address, Coins, NodeIndex, RootIdentity};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// RING CONFIGURATION
// =============================================================================

/// Immutable root configuration of one ring.
///
/// Every node receives the same `RingConfig`; nothing in it changes once the
/// ring exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Key material every node address is derived from.
    pub root_identity: RootIdentity,
    /// The only principal allowed to originate operations.
    pub owner: Address,
    /// Number of nodes. Zero is a legal, empty ring.
    pub ring_size: u32,
    /// Per-hop charges.
    pub costs: CostSchedule,
}

impl RingConfig {
    /// Creates a configuration with the default cost schedule.
    #[must_use]
    pub fn new(root_identity: RootIdentity, owner: Address, ring_size: u32) -> Self {
        Self {
            root_identity,
            owner,
            ring_size,
            costs: CostSchedule::default(),
        }
    }

    /// Replaces the cost schedule.
    #[must_use]
    pub fn with_costs(mut self, costs: CostSchedule) -> Self {
        self.costs = costs;
        self
    }

    /// Address of node `index`. Defined for any index, in the ring or not.
    #[must_use]
    pub fn node_address(&self, index: NodeIndex) -> Address {
        derive_node_address(&self.root_identity, index)
    }

    /// Address of the root node, which doubles as the ring's identity.
    #[must_use]
    pub fn root_address(&self) -> Address {
        self.node_address(0)
    }

    /// Returns true if `index` names a node of this ring.
    #[must_use]
    pub const fn contains(&self, index: NodeIndex) -> bool {
        index < self.ring_size
    }

    /// Index after `index`, or `None` at the end of the ring. Never wraps.
    #[must_use]
    pub fn successor(&self, index: NodeIndex) -> Option<NodeIndex> {
        index.checked_add(1).filter(|next| self.contains(*next))
    }

    /// Index before `index`, or `None` for the root.
    #[must_use]
    pub fn predecessor(&self, index: NodeIndex) -> Option<NodeIndex> {
        index.checked_sub(1)
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Lifecycle of a single node.
///
/// ```text
/// Uninitialized ──Init──→ Active ──Clean──→ Cleaned
///                           │                  │
///                           └──Destroy──→ Destroyed ←──Destroy──┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Never materialized. Holds nothing.
    #[default]
    Uninitialized,
    /// Materialized and accepting writes.
    Active,
    /// Payload compacted. Still materialized.
    Cleaned,
    /// Material released. Terminal.
    Destroyed,
}

impl LifecycleState {
    /// Returns true while the node holds a payload.
    #[must_use]
    pub const fn is_materialized(self) -> bool {
        matches!(self, Self::Active | Self::Cleaned)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Cleaned => "cleaned",
            Self::Destroyed => "destroyed",
        })
    }
}

// =============================================================================
// NODE
// =============================================================================

/// One storage node.
///
/// Mutation goes through the ring controller only; everything else sees a
/// [`NodeView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    index: NodeIndex,
    address: Address,
    owner: Option<Address>,
    state: LifecycleState,
    payload: Option<Payload>,
    balance: Coins,
}

impl Node {
    /// A fresh, uninitialized node reachable at `address`.
    #[must_use]
    pub fn new(index: NodeIndex, address: Address) -> Self {
        Self {
            index,
            address,
            owner: None,
            state: LifecycleState::Uninitialized,
            payload: None,
            balance: Coins::ZERO,
        }
    }

    /// Ring index.
    #[must_use]
    pub const fn index(&self) -> NodeIndex {
        self.index
    }

    /// Address the node was reached at.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Owner, set once at materialization.
    #[must_use]
    pub const fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Payload, present only while materialized.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Value held by the node.
    #[must_use]
    pub const fn balance(&self) -> Coins {
        self.balance
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn view(&self) -> NodeView {
        NodeView {
            index: self.index,
            address: self.address,
            state: self.state,
            is_cleaned: self.state == LifecycleState::Cleaned,
            owner: self.owner,
            payload_size: self.payload.as_ref().map(Payload::size),
            payload: self.payload.clone(),
            balance: self.balance,
        }
    }

    pub(crate) fn materialize(&mut self, owner: Address, deposit: Coins) {
        // Ownership never changes once set, even across Destroy.
        self.owner.get_or_insert(owner);
        self.state = LifecycleState::Active;
        self.payload = Some(Payload::new());
        self.balance = deposit;
    }

    pub(crate) fn compact(&mut self) -> (u64, u64) {
        self.state = LifecycleState::Cleaned;
        self.payload.as_mut().map_or((0, 0), Payload::compact)
    }

    pub(crate) fn dematerialize(&mut self) -> Coins {
        self.state = LifecycleState::Destroyed;
        self.payload = None;
        std::mem::replace(&mut self.balance, Coins::ZERO)
    }

    pub(crate) fn payload_mut(&mut self) -> Option<&mut Payload> {
        self.payload.as_mut()
    }
}

/// Snapshot of a node as seen from outside.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    /// Ring index.
    pub index: NodeIndex,
    /// Node address.
    pub address: Address,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// True once the node has been compacted and not destroyed since.
    pub is_cleaned: bool,
    /// Owner, if the node was ever materialized.
    pub owner: Option<Address>,
    /// Payload, or `None` when the node holds no material.
    pub payload: Option<Payload>,
    /// Encoded payload size, or `None` when there is no payload.
    pub payload_size: Option<u64>,
    /// Value held by the node.
    pub balance: Coins,
}

impl NodeView {
    /// Returns true if the node currently holds material.
    #[must_use]
    pub fn has_material(&self) -> bool {
        self.payload.is_some()
    }
}
