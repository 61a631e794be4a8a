//! # Value Objects
//!
//! Small immutable types shared by the domain layer.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use shared_types::entities::{Address, Coins, Opcode, RootIdentity};

/// Position of a node in the ring. Index 0 is the root.
pub type NodeIndex = u32;

/// Caller-chosen correlation token. Never interpreted by the ring.
pub type QueryId = u64;

/// Dictionary key inside a node payload.
pub type EntryKey = u32;

/// Anything a node can be asked to do.
///
/// `Store` is node-local; the other three are ring-wide and map onto
/// [`Opcode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Materialize.
    Init,
    /// Compact the payload.
    Clean,
    /// Dematerialize.
    Destroy,
    /// Append one entry to the payload.
    Store,
}

impl From<Opcode> for Operation {
    fn from(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Init => Self::Init,
            Opcode::Clean => Self::Clean,
            Opcode::Destroy => Self::Destroy,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Clean => "clean",
            Self::Destroy => "destroy",
            Self::Store => "store",
        })
    }
}

/// How a message reached the node that is processing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Sent by the owner straight to this node.
    Direct,
    /// Forwarded by the predecessor sibling as part of a sweep.
    Transitive,
}

impl Delivery {
    /// Returns true for owner originations.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        matches!(self, Self::Direct)
    }
}
