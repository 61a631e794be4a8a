//! # Ring Events
//!
//! Everything a ring node reports while processing a message.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, Coins, Opcode};
use uuid::Uuid;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingEvent {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// A node left `Uninitialized` and now holds an empty payload.
    NodeMaterialized {
        /// Sweep that materialized the node.
        sweep_id: Uuid,
        /// Ring index.
        index: u32,
        /// Derived node address.
        address: Address,
        /// Value the node retained as its storage deposit.
        deposit: Coins,
    },

    /// A node compacted its payload.
    NodeCleaned {
        /// Sweep that cleaned the node.
        sweep_id: Uuid,
        /// Ring index.
        index: u32,
        /// Payload size before compaction, in bytes.
        size_before: u64,
        /// Payload size after compaction, in bytes.
        size_after: u64,
    },

    /// A node released its payload and is now dead for this ring.
    NodeDestroyed {
        /// Sweep that destroyed the node.
        sweep_id: Uuid,
        /// Ring index.
        index: u32,
        /// Value reclaimed from the node into the sweep budget.
        reclaimed: Coins,
    },

    /// A node had nothing to do for this opcode but passed the sweep on.
    HopSkipped {
        /// Sweep being forwarded.
        sweep_id: Uuid,
        /// Ring index.
        index: u32,
        /// Operation that was skipped locally.
        opcode: Opcode,
    },

    /// The last node of a sweep finished; no further hop was sent.
    SweepCompleted {
        /// Sweep that finished.
        sweep_id: Uuid,
        /// Index of the terminal node.
        index: u32,
        /// Operation of the sweep.
        opcode: Opcode,
        /// Residual budget returned to the owner.
        refund: Coins,
    },

    // =========================================================================
    // HALTS
    // =========================================================================
    /// A node refused the message; nodes beyond it are not visited.
    SweepHalted {
        /// Sweep that was halted.
        sweep_id: Uuid,
        /// Index of the refusing node.
        index: u32,
        /// Operation of the sweep, if the message was a control message.
        opcode: Option<Opcode>,
        /// Human-readable reason.
        reason: String,
    },

    // =========================================================================
    // STORAGE
    // =========================================================================
    /// An entry was appended to a node payload.
    EntryStored {
        /// Ring index.
        index: u32,
        /// Dictionary key written.
        key: u32,
        /// Payload size after the write, in bytes.
        payload_size: u64,
    },
}

impl RingEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NodeMaterialized { .. }
            | Self::NodeCleaned { .. }
            | Self::NodeDestroyed { .. }
            | Self::HopSkipped { .. }
            | Self::SweepCompleted { .. } => EventTopic::Lifecycle,
            Self::SweepHalted { .. } => EventTopic::Halts,
            Self::EntryStored { .. } => EventTopic::Storage,
        }
    }

    /// Ring index of the reporting node.
    #[must_use]
    pub fn index(&self) -> u32 {
        match self {
            Self::NodeMaterialized { index, .. }
            | Self::NodeCleaned { index, .. }
            | Self::NodeDestroyed { index, .. }
            | Self::HopSkipped { index, .. }
            | Self::SweepCompleted { index, .. }
            | Self::SweepHalted { index, .. }
            | Self::EntryStored { index, .. } => *index,
        }
    }

    /// Sweep this event belongs to, if any.
    #[must_use]
    pub fn sweep_id(&self) -> Option<Uuid> {
        match self {
            Self::NodeMaterialized { sweep_id, .. }
            | Self::NodeCleaned { sweep_id, .. }
            | Self::NodeDestroyed { sweep_id, .. }
            | Self::HopSkipped { sweep_id, .. }
            | Self::SweepCompleted { sweep_id, .. }
            | Self::SweepHalted { sweep_id, .. } => Some(*sweep_id),
            Self::EntryStored { .. } => None,
        }
    }

    /// Whether this event is the last one a sweep produces.
    #[must_use]
    pub fn is_sweep_end(&self) -> bool {
        matches!(self, Self::SweepCompleted { .. } | Self::SweepHalted { .. })
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// State transitions and sweep completion.
    Lifecycle,
    /// Sweeps stopped by a node-local failure.
    Halts,
    /// Payload writes.
    Storage,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Ring indices to include. Empty means every index.
    pub indices: Vec<u32>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            indices: Vec::new(),
        }
    }

    /// Create a filter for events from specific ring indices.
    #[must_use]
    pub fn from_indices(indices: Vec<u32>) -> Self {
        Self {
            topics: Vec::new(),
            indices,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &RingEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let index_match = self.indices.is_empty() || self.indices.contains(&event.index());

        topic_match && index_match
    }
}
