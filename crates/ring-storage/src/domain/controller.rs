//! # Ring Controller
//!
//! Per-message transition logic. Given a node and one envelope, decide the
//! local mutation, apply it, and build the follow-on message if the sweep
//! continues. Nothing here performs I/O; delivering the follow-on message is
//! the relay's job.
//!
//! ## Processing Order
//!
//! 1. Envelope version and recipient address
//! 2. Sender classification (owner = direct, predecessor = transitive)
//! 3. Local step for the opcode and current state
//! 4. Budget: the local cost is taken before anything changes
//! 5. Mutation, then forwarding decision
//!
//! Any failure in steps 1-4 leaves the node untouched and forwards nothing.

use super::entities::{LifecycleState, Node, RingConfig};
use super::gate::OwnerGate;
use super::payload::PayloadEntry;
use super::value_objects::{Address, Coins, Delivery, EntryKey, NodeIndex, Opcode, Operation};
use crate::errors::RingError;
use crate::messages::{ControlMessage, NodeEnvelope, NodeRequest, StoreRequest};

// =============================================================================
// OUTCOMES
// =============================================================================

/// What a node did locally for a control message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalAction {
    /// Uninitialized → Active.
    Materialized {
        /// Value now held by the node.
        deposit: Coins,
    },
    /// Active → Cleaned.
    Cleaned {
        /// Payload size before compaction.
        size_before: u64,
        /// Payload size after compaction.
        size_after: u64,
    },
    /// Active/Cleaned → Destroyed.
    Destroyed {
        /// Value returned to the sweep budget.
        reclaimed: Coins,
    },
    /// Nothing to do here; the sweep passes through.
    Skipped,
}

/// Result of one successful control hop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HopOutcome {
    /// Index of the node that processed the message.
    pub index: NodeIndex,
    /// Operation processed.
    pub opcode: Opcode,
    /// How the message arrived.
    pub delivery: Delivery,
    /// Local effect.
    pub action: LocalAction,
    /// Cost deducted from the incoming budget.
    pub charged: Coins,
    /// Budget left after this hop, reclaimed value included.
    pub residual: Coins,
    /// Message for the successor, if the sweep continues.
    pub forward: Option<NodeEnvelope>,
}

/// Result of a successful store request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOutcome {
    /// Index of the node written to.
    pub index: NodeIndex,
    /// Key written.
    pub key: EntryKey,
    /// Payload size after the write.
    pub payload_size: u64,
    /// Cost of the write.
    pub charged: Coins,
    /// Unused part of the attached budget.
    pub refund: Coins,
}

/// Result of any successfully processed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeOutcome {
    /// A ring-wide control hop.
    Hop(HopOutcome),
    /// A payload write.
    Stored(StoreOutcome),
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Local step selected for a control message, before budget is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Materialize,
    Compact,
    Dematerialize,
    Skip,
}

/// Applies ring messages to nodes of one ring.
#[derive(Debug, Clone, Copy)]
pub struct RingController<'a> {
    config: &'a RingConfig,
}

impl<'a> RingController<'a> {
    /// Creates a controller for `config`.
    #[must_use]
    pub const fn new(config: &'a RingConfig) -> Self {
        Self { config }
    }

    /// Processes one envelope against `node`.
    ///
    /// On error the node is unchanged.
    pub fn handle(&self, node: &mut Node, envelope: &NodeEnvelope) -> Result<NodeOutcome, RingError> {
        envelope.verify_version()?;
        self.check_recipient(node, envelope)?;

        match &envelope.payload {
            NodeRequest::Control { body, budget } => {
                let message = ControlMessage::decode(body, *budget)?;
                self.handle_control(node, envelope, &message).map(NodeOutcome::Hop)
            }
            NodeRequest::Store(request) => self
                .handle_store(node, envelope.sender, request)
                .map(NodeOutcome::Stored),
        }
    }

    fn check_recipient(&self, node: &Node, envelope: &NodeEnvelope) -> Result<(), RingError> {
        let own = self.config.node_address(node.index());
        if envelope.recipient != own || node.address() != own {
            return Err(RingError::AddressMismatch {
                expected: own,
                actual: envelope.recipient,
            });
        }

        let claimed = self.config.node_address(envelope.recipient_index);
        if claimed != own {
            return Err(RingError::AddressMismatch {
                expected: claimed,
                actual: envelope.recipient,
            });
        }
        Ok(())
    }

    fn handle_control(
        &self,
        node: &mut Node,
        envelope: &NodeEnvelope,
        message: &ControlMessage,
    ) -> Result<HopOutcome, RingError> {
        let gate = OwnerGate::new(self.config);
        let delivery = gate.classify(envelope.sender, node)?;
        let step = self.select_step(node, envelope.sender, message.opcode, delivery)?;

        let charged = self.step_cost(step);
        let after_fee = message
            .budget
            .checked_sub(charged)
            .ok_or(RingError::InsufficientBudget {
                required: charged,
                available: message.budget,
            })?;

        let owner = gate.owner_of(node);
        let action = match step {
            Step::Materialize => {
                let deposit = self.config.costs.storage_deposit;
                node.materialize(owner, deposit);
                LocalAction::Materialized { deposit }
            }
            Step::Compact => {
                let (size_before, size_after) = node.compact();
                LocalAction::Cleaned {
                    size_before,
                    size_after,
                }
            }
            Step::Dematerialize => LocalAction::Destroyed {
                reclaimed: node.dematerialize(),
            },
            Step::Skip => LocalAction::Skipped,
        };

        let residual = match action {
            LocalAction::Destroyed { reclaimed } => after_fee.saturating_add(reclaimed),
            _ => after_fee,
        };

        let remaining = message.scope_remaining.saturating_sub(1);
        let forward = if remaining > 0 {
            self.config.successor(node.index()).map(|next| {
                envelope.relay(
                    node.address(),
                    self.config.node_address(next),
                    next,
                    NodeRequest::control(message.next_hop(remaining, residual)),
                )
            })
        } else {
            None
        };

        Ok(HopOutcome {
            index: node.index(),
            opcode: message.opcode,
            delivery,
            action,
            charged,
            residual,
            forward,
        })
    }

    fn select_step(
        &self,
        node: &Node,
        sender: Address,
        opcode: Opcode,
        delivery: Delivery,
    ) -> Result<Step, RingError> {
        let state = node.state();
        let step = match (opcode, state) {
            // Init sweeps enter at the root; past it they are forwarded only.
            (Opcode::Init, _) if delivery.is_direct() && node.index() != 0 => {
                return Err(RingError::Unauthorized {
                    requester: sender,
                    owner: OwnerGate::new(self.config).owner_of(node),
                });
            }
            // Nodes outside the ring never materialize.
            (Opcode::Init, LifecycleState::Uninitialized) if self.config.contains(node.index()) => {
                Step::Materialize
            }
            (Opcode::Init, _) => Step::Skip,

            (Opcode::Clean, LifecycleState::Active) => Step::Compact,
            (Opcode::Clean, _) if delivery.is_direct() => {
                return Err(RingError::InvalidTransition {
                    operation: opcode.into(),
                    state,
                });
            }
            (Opcode::Clean, _) => Step::Skip,

            (Opcode::Destroy, state) if state.is_materialized() => Step::Dematerialize,
            (Opcode::Destroy, _) => Step::Skip,
        };
        Ok(step)
    }

    fn step_cost(&self, step: Step) -> Coins {
        let costs = &self.config.costs;
        match step {
            Step::Materialize => costs.init_cost(),
            Step::Compact => costs.clean_cost(),
            Step::Dematerialize => costs.destroy_cost(),
            Step::Skip => costs.skip_cost(),
        }
    }

    fn handle_store(
        &self,
        node: &mut Node,
        sender: Address,
        request: &StoreRequest,
    ) -> Result<StoreOutcome, RingError> {
        OwnerGate::new(self.config).require_owner(sender, node)?;

        let index = node.index();
        let state = node.state();
        let payload = match (state, node.payload_mut()) {
            (LifecycleState::Active, Some(payload)) => payload,
            _ => {
                return Err(RingError::InvalidTransition {
                    operation: Operation::Store,
                    state,
                })
            }
        };

        let entry_bytes = PayloadEntry {
            key: request.key,
            value: request.value.clone(),
        }
        .encoded_len();
        let charged = self.config.costs.store_cost(entry_bytes);
        let refund = request
            .budget
            .checked_sub(charged)
            .ok_or(RingError::InsufficientBudget {
                required: charged,
                available: request.budget,
            })?;

        payload.store(request.key, request.value.clone());
        Ok(StoreOutcome {
            index,
            key: request.key,
            payload_size: payload.size(),
            charged,
            refund,
        })
    }
}
