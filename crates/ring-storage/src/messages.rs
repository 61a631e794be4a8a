//! # Messages
//!
//! What travels between nodes, and the wire body of a control message.
//!
//! ## Control body (16 bytes, big-endian)
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | opcode tag (`42` Init, `24` Clean, `3210` Destroy) |
//! | 4 | 8 | query id |
//! | 12 | 4 | scope remaining |
//!
//! The budget is the value attached to the message, not part of the body.
//! Control requests travel between nodes in this encoded form and are decoded
//! by the receiving node.

use crate::domain::value_objects::{Coins, EntryKey, Opcode, QueryId};
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};
use shared_types::RingEnvelope;

// =============================================================================
// CONTROL MESSAGE
// =============================================================================

/// A ring-wide lifecycle instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Operation to perform.
    pub opcode: Opcode,
    /// Caller's correlation token, copied to every hop.
    pub query_id: QueryId,
    /// Nodes still to touch, the receiver included.
    pub scope_remaining: u32,
    /// Value attached to the message.
    pub budget: Coins,
}

impl ControlMessage {
    /// Length of the encoded body.
    pub const WIRE_LEN: usize = 16;

    /// Builds a control message.
    #[must_use]
    pub const fn new(opcode: Opcode, query_id: QueryId, scope_remaining: u32, budget: Coins) -> Self {
        Self {
            opcode,
            query_id,
            scope_remaining,
            budget,
        }
    }

    /// Init over `scope` nodes.
    #[must_use]
    pub const fn init(query_id: QueryId, scope: u32, budget: Coins) -> Self {
        Self::new(Opcode::Init, query_id, scope, budget)
    }

    /// Clean over `scope` nodes.
    #[must_use]
    pub const fn clean(query_id: QueryId, scope: u32, budget: Coins) -> Self {
        Self::new(Opcode::Clean, query_id, scope, budget)
    }

    /// Destroy over `scope` nodes.
    #[must_use]
    pub const fn destroy(query_id: QueryId, scope: u32, budget: Coins) -> Self {
        Self::new(Opcode::Destroy, query_id, scope, budget)
    }

    /// The message the next node receives: one unit of scope spent, budget
    /// replaced by what is left after this hop.
    #[must_use]
    pub const fn next_hop(&self, scope_remaining: u32, residual: Coins) -> Self {
        Self::new(self.opcode, self.query_id, scope_remaining, residual)
    }

    /// Encodes the wire body.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
        let mut body = [0u8; Self::WIRE_LEN];
        body[0..4].copy_from_slice(&self.opcode.tag().to_be_bytes());
        body[4..12].copy_from_slice(&self.query_id.to_be_bytes());
        body[12..16].copy_from_slice(&self.scope_remaining.to_be_bytes());
        body
    }

    /// Decodes a wire body. `budget` is the value that came with it.
    pub fn decode(body: &[u8], budget: Coins) -> Result<Self, CodecError> {
        let body: &[u8; Self::WIRE_LEN] = body.try_into().map_err(|_| CodecError::BadLength {
            expected: Self::WIRE_LEN,
            actual: body.len(),
        })?;

        let mut tag = [0u8; 4];
        tag.copy_from_slice(&body[0..4]);
        let mut query_id = [0u8; 8];
        query_id.copy_from_slice(&body[4..12]);
        let mut scope = [0u8; 4];
        scope.copy_from_slice(&body[12..16]);

        let tag = u32::from_be_bytes(tag);
        let opcode = Opcode::from_tag(tag).ok_or(CodecError::UnknownOpcode(tag))?;
        Ok(Self::new(
            opcode,
            u64::from_be_bytes(query_id),
            u32::from_be_bytes(scope),
            budget,
        ))
    }
}

// =============================================================================
// STORE REQUEST
// =============================================================================

/// Owner write to a single node's payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRequest {
    /// Dictionary key.
    pub key: EntryKey,
    /// Value, or `None` to delete the key.
    pub value: Option<Vec<u8>>,
    /// Value attached to pay for the write.
    pub budget: Coins,
}

impl StoreRequest {
    /// Write `value` under `key`.
    #[must_use]
    pub fn put(key: EntryKey, value: impl Into<Vec<u8>>, budget: Coins) -> Self {
        Self {
            key,
            value: Some(value.into()),
            budget,
        }
    }

    /// Delete `key`.
    #[must_use]
    pub const fn delete(key: EntryKey, budget: Coins) -> Self {
        Self {
            key,
            value: None,
            budget,
        }
    }
}

// =============================================================================
// NODE REQUEST
// =============================================================================

/// Everything a node inbox can carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRequest {
    /// Ring-wide lifecycle step, as its wire body plus the value attached to it.
    Control {
        /// Encoded [`ControlMessage`] body.
        body: Vec<u8>,
        /// Value attached to the message.
        budget: Coins,
    },
    /// Node-local payload write.
    Store(StoreRequest),
}

impl NodeRequest {
    /// Encodes `message` for the wire.
    #[must_use]
    pub fn control(message: ControlMessage) -> Self {
        Self::Control {
            body: message.encode().to_vec(),
            budget: message.budget,
        }
    }

    /// Decodes the control body, if this is a control request.
    #[must_use]
    pub fn decode_control(&self) -> Option<Result<ControlMessage, CodecError>> {
        match self {
            Self::Control { body, budget } => Some(ControlMessage::decode(body, *budget)),
            Self::Store(_) => None,
        }
    }

    /// Returns true for ring-wide control requests, decodable or not.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Control { .. })
    }

    /// Opcode, for control requests whose body decodes.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        self.decode_control()
            .and_then(Result::ok)
            .map(|message| message.opcode)
    }

    /// Value attached to the request.
    #[must_use]
    pub const fn budget(&self) -> Coins {
        match self {
            Self::Control { budget, .. } => *budget,
            Self::Store(request) => request.budget,
        }
    }
}

/// A request on its way to a node.
pub type NodeEnvelope = RingEnvelope<NodeRequest>;
