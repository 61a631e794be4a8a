//! # Domain Invariants
//!
//! Properties every successful control hop must satisfy. The relay checks
//! them after each hop and reports violations; they never change behaviour.

use super::controller::{HopOutcome, LocalAction};
use super::entities::RingConfig;
use super::value_objects::{Address, Coins};
use crate::messages::ControlMessage;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Scope drops by exactly one per hop, and a hop is only sent while scope is
/// left.
#[must_use]
pub fn check_scope_invariant(incoming: &ControlMessage, outcome: &HopOutcome) -> bool {
    match forwarded_message(outcome) {
        Some(next) => next.scope_remaining > 0 && next.scope_remaining + 1 == incoming.scope_remaining,
        None => true,
    }
}

/// Forwarding goes to the next index only, and never past the ring end.
#[must_use]
pub fn check_ring_bounds_invariant(config: &RingConfig, outcome: &HopOutcome) -> bool {
    match &outcome.forward {
        Some(envelope) => {
            config.successor(outcome.index) == Some(envelope.recipient_index)
                && envelope.recipient == config.node_address(envelope.recipient_index)
        }
        None => true,
    }
}

/// Cleaning never grows a payload.
#[must_use]
pub fn check_payload_shrink_invariant(outcome: &HopOutcome) -> bool {
    match outcome.action {
        LocalAction::Cleaned {
            size_before,
            size_after,
        } => size_after <= size_before,
        _ => true,
    }
}

/// Value is conserved: what leaves the hop equals what came in, minus the
/// charge, plus anything reclaimed.
#[must_use]
pub fn check_budget_invariant(incoming: &ControlMessage, outcome: &HopOutcome) -> bool {
    let reclaimed = match outcome.action {
        LocalAction::Destroyed { reclaimed } => reclaimed,
        _ => Coins::ZERO,
    };
    let expected = incoming
        .budget
        .checked_sub(outcome.charged)
        .map(|left| left.saturating_add(reclaimed));

    let carried = forwarded_message(outcome).map_or(outcome.residual, |next| next.budget);
    expected == Some(outcome.residual) && carried == outcome.residual
}

/// A recorded owner never changes.
#[must_use]
pub fn check_ownership_invariant(before: Option<Address>, after: Option<Address>) -> bool {
    before.is_none() || before == after
}

/// Check all hop invariants at once.
#[must_use]
pub fn check_all_invariants(
    config: &RingConfig,
    incoming: &ControlMessage,
    outcome: &HopOutcome,
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_scope_invariant(incoming, outcome) {
        violations.push(InvariantViolation::ScopeNotDecremented {
            incoming: incoming.scope_remaining,
            forwarded: forwarded_message(outcome).map(|next| next.scope_remaining),
        });
    }

    if !check_ring_bounds_invariant(config, outcome) {
        violations.push(InvariantViolation::ForwardOutOfBounds {
            from: outcome.index,
            to: outcome.forward.as_ref().map(|env| env.recipient_index),
        });
    }

    if !check_payload_shrink_invariant(outcome) {
        violations.push(InvariantViolation::PayloadGrew);
    }

    if !check_budget_invariant(incoming, outcome) {
        violations.push(InvariantViolation::BudgetNotConserved {
            incoming: incoming.budget,
            residual: outcome.residual,
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

fn forwarded_message(outcome: &HopOutcome) -> Option<ControlMessage> {
    outcome
        .forward
        .as_ref()
        .and_then(|envelope| envelope.payload.decode_control())
        .and_then(Result::ok)
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Forwarded scope is not incoming scope minus one.
    ScopeNotDecremented { incoming: u32, forwarded: Option<u32> },
    /// Forward target is not the in-ring successor.
    ForwardOutOfBounds { from: u32, to: Option<u32> },
    /// Compaction produced a larger payload.
    PayloadGrew,
    /// Residual budget does not add up.
    BudgetNotConserved { incoming: Coins, residual: Coins },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScopeNotDecremented { incoming, forwarded } => {
                write!(f, "scope not decremented: {incoming} -> {forwarded:?}")
            }
            Self::ForwardOutOfBounds { from, to } => {
                write!(f, "forward out of bounds: {from} -> {to:?}")
            }
            Self::PayloadGrew => write!(f, "payload grew during compaction"),
            Self::BudgetNotConserved { incoming, residual } => {
                write!(f, "budget not conserved: incoming {incoming}, residual {residual}")
            }
        }
    }
}
