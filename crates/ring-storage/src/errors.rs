//! # Error Types
//!
//! All error types for ring processing, relaying and wire decoding.

use crate::domain::entities::LifecycleState;
use crate::domain::value_objects::{Address, Coins, Operation};
use shared_types::EnvelopeError;
use thiserror::Error;

// =============================================================================
// RING ERRORS
// =============================================================================

/// Node-local failures.
///
/// Each one stops the sweep at the failing node: nothing is mutated, nothing
/// is charged and nothing is forwarded. Earlier hops are not rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    /// Sender is neither the owner nor the predecessor sibling.
    #[error("unauthorized sender {requester:?} (owner is {owner:?})")]
    Unauthorized {
        /// Who sent the message.
        requester: Address,
        /// Who owns the ring.
        owner: Address,
    },

    /// The node's state does not allow the requested operation.
    #[error("cannot {operation} a node in state {state}")]
    InvalidTransition {
        /// Requested operation.
        operation: Operation,
        /// State the node was in.
        state: LifecycleState,
    },

    /// The carried budget cannot pay for this hop.
    #[error("insufficient budget: required {required}, available {available}")]
    InsufficientBudget {
        /// Local cost of the hop.
        required: Coins,
        /// Budget carried by the message.
        available: Coins,
    },

    /// The message was addressed to a different identity than this node's.
    #[error("address mismatch: expected {expected:?}, got {actual:?}")]
    AddressMismatch {
        /// Address derived for the node's index.
        expected: Address,
        /// Address the message was sent to.
        actual: Address,
    },

    /// Envelope version is not understood.
    #[error("envelope rejected: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Control body could not be decoded.
    #[error("malformed control body: {0}")]
    Codec(#[from] CodecError),
}

impl RingError {
    /// Stable label for logs, stats and halt events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InsufficientBudget { .. } => "insufficient_budget",
            Self::AddressMismatch { .. } => "address_mismatch",
            Self::Envelope(_) => "envelope",
            Self::Codec(_) => "codec",
        }
    }
}

// =============================================================================
// RELAY ERRORS
// =============================================================================

/// Failures of the delivery substrate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The relay was shut down.
    #[error("relay is shut down")]
    Closed,

    /// The target node's inbox is gone.
    #[error("inbox for {0:?} is closed")]
    InboxClosed(Address),

    /// Messages were still in flight when the wait ran out.
    #[error("relay not idle after {waited_ms}ms ({pending} messages in flight)")]
    IdleTimeout {
        /// How long we waited.
        waited_ms: u64,
        /// Messages queued or being processed.
        pending: usize,
    },
}

// =============================================================================
// CODEC ERRORS
// =============================================================================

/// Failures decoding a control message body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Body is not exactly the expected length.
    #[error("control body must be {expected} bytes, got {actual}")]
    BadLength {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Opcode tag is not one of the ring operations.
    #[error("unknown opcode tag {0}")]
    UnknownOpcode(u32),
}
