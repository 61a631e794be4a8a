//! # Ring Storage - Leaderless Storage Ring
//!
//! A ring of `N` independently addressable storage nodes. Three ring-wide
//! operations travel node to node with no coordinator:
//!
//! | Operation | Tag | Effect on each visited node |
//! |-----------|-----|-----------------------------|
//! | Init | `42` | Uninitialized → Active, empty payload, deposit held |
//! | Clean | `24` | Active → Cleaned, payload compacted |
//! | Destroy | `3210` | Active/Cleaned → Destroyed, deposit returned to the sweep |
//!
//! Every node address is `keccak256(tag, root identity, index)[12..]`, so any
//! node can be found from the ring configuration alone.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Scope drops by exactly one per hop | `domain/controller.rs`, checked in `domain/invariants.rs` |
//! | No forwarding past the last index | `RingConfig::successor` |
//! | Clean never grows a payload | `Payload::compact`, checked in `domain/invariants.rs` |
//! | Budget is conserved per hop | `domain/invariants.rs` - `check_budget_invariant()` |
//! | Ownership is immutable | `Node::materialize` |
//!
//! ## Authorization
//!
//! | Message | Accepted Sender(s) | Enforcement |
//! |---------|--------------------|-------------|
//! | Control (any index) | ring owner | `OwnerGate::classify` |
//! | Control (index > 0) | predecessor sibling | `OwnerGate::authorize_forward` |
//! | Store | ring owner only | `OwnerGate::require_owner` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ring_storage::prelude::*;
//!
//! let (service, bus) = RingService::in_memory(config, ServiceConfig::default());
//! service.init_ring(owner, 1, budget).await?;
//! service.settle().await?;
//!
//! for view in service.scan().await {
//!     println!("{} {}", view.index, view.state);
//! }
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod messages;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{LifecycleState, Node, NodeView, RingConfig};

    // Value objects
    pub use crate::domain::value_objects::{
        Address, Coins, Delivery, EntryKey, NodeIndex, Opcode, Operation, QueryId, RootIdentity,
    };

    // Domain services
    pub use crate::domain::controller::{HopOutcome, LocalAction, NodeOutcome, RingController, StoreOutcome};
    pub use crate::domain::fees::{costs, CostSchedule};
    pub use crate::domain::gate::OwnerGate;
    pub use crate::domain::payload::{Payload, PayloadEntry};
    pub use crate::domain::services::{derive_node_address, keccak256};

    // Invariants
    pub use crate::domain::invariants::{check_all_invariants, InvariantCheckResult, InvariantViolation};

    // Messages
    pub use crate::messages::{ControlMessage, NodeEnvelope, NodeRequest, StoreRequest};

    // Ports
    pub use crate::ports::inbound::RingApi;
    pub use crate::ports::outbound::{MessageRelay, RingObserver};

    // Adapters
    pub use crate::adapters::{InMemoryRelay, RelayStats};

    // Errors
    pub use crate::errors::{CodecError, RelayError, RingError};

    // Service
    pub use crate::service::{RingService, ServiceConfig, ServiceStats};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
