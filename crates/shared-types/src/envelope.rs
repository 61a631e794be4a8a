//! # `RingEnvelope` Wrapper
//!
//! The wrapper for every message delivered to a ring node.
//!
//! ## Properties
//!
//! - **Versioning**: every envelope carries a `version` for forward compatibility.
//! - **Addressing**: `recipient` is the derived address of `recipient_index`;
//!   the receiving node recomputes it and rejects mismatches.
//! - **Correlation**: `sweep_id` is assigned once at origination and copied to
//!   every hop, so events from one sweep can be grouped.
//! - **Envelope Authority**: `sender` is the sole source of the sender's identity.

use crate::entities::Address;
use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message addressed to one ring node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingEnvelope<T> {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Who sent this message: the owner for originations, the predecessor
    /// node for forwarded hops.
    pub sender: Address,

    /// Address the sender believes belongs to `recipient_index`.
    pub recipient: Address,

    /// Ring index this message is meant for.
    pub recipient_index: u32,

    /// Identifier shared by every hop of one sweep.
    pub sweep_id: Uuid,

    /// The message payload.
    pub payload: T,
}

impl<T> RingEnvelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wraps a payload for `recipient` at `recipient_index`.
    pub fn new(sender: Address, recipient: Address, recipient_index: u32, sweep_id: Uuid, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sender,
            recipient,
            recipient_index,
            sweep_id,
            payload,
        }
    }

    /// Checks that the envelope version is supported.
    pub fn verify_version(&self) -> Result<(), EnvelopeError> {
        if self.version == Self::CURRENT_VERSION {
            Ok(())
        } else {
            Err(EnvelopeError::UnsupportedVersion {
                received: self.version,
                supported: Self::CURRENT_VERSION,
            })
        }
    }

    /// Builds the next hop's envelope, keeping the sweep id.
    pub fn relay<U>(&self, sender: Address, recipient: Address, recipient_index: u32, payload: U) -> RingEnvelope<U> {
        RingEnvelope::new(sender, recipient, recipient_index, self.sweep_id, payload)
    }
}
