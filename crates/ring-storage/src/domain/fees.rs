//! # Cost Schedule
//!
//! What each hop charges against the budget carried by a message.

use super::value_objects::Coins;
use serde::{Deserialize, Serialize};

/// Default costs, in nano-units.
pub mod costs {
    /// Flat fee every node charges for processing a message.
    pub const HOP_FEE: u64 = 10_000_000;
    /// Value a node keeps for itself when it materializes.
    pub const STORAGE_DEPOSIT: u64 = 50_000_000;
    /// Extra fee for compacting a payload.
    pub const CLEAN_FEE: u64 = 20_000_000;
    /// Fee per byte appended to a payload.
    pub const STORE_FEE_PER_BYTE: u64 = 1_000;
}

/// Per-hop charges of one ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSchedule {
    /// Charged by every node that processes a message.
    pub hop_fee: Coins,
    /// Held by a node while it is materialized, returned on Destroy.
    pub storage_deposit: Coins,
    /// Charged on top of the hop fee when a payload is compacted.
    pub clean_fee: Coins,
    /// Charged per byte of a stored entry.
    pub store_fee_per_byte: Coins,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            hop_fee: Coins(costs::HOP_FEE),
            storage_deposit: Coins(costs::STORAGE_DEPOSIT),
            clean_fee: Coins(costs::CLEAN_FEE),
            store_fee_per_byte: Coins(costs::STORE_FEE_PER_BYTE),
        }
    }
}

impl CostSchedule {
    /// A schedule where nothing costs anything.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            hop_fee: Coins::ZERO,
            storage_deposit: Coins::ZERO,
            clean_fee: Coins::ZERO,
            store_fee_per_byte: Coins::ZERO,
        }
    }

    /// Cost of an Init hop that materializes a node, deposit included.
    #[must_use]
    pub fn init_cost(&self) -> Coins {
        self.hop_fee.saturating_add(self.storage_deposit)
    }

    /// Cost of a Clean hop that compacts a payload.
    #[must_use]
    pub fn clean_cost(&self) -> Coins {
        self.hop_fee.saturating_add(self.clean_fee)
    }

    /// Cost of a hop with nothing to do locally.
    #[must_use]
    pub fn skip_cost(&self) -> Coins {
        self.hop_fee
    }

    /// Cost of a Destroy hop.
    #[must_use]
    pub fn destroy_cost(&self) -> Coins {
        self.hop_fee
    }

    /// Cost of storing an entry of `bytes` encoded bytes.
    #[must_use]
    pub fn store_cost(&self, bytes: u64) -> Coins {
        Coins(self.store_fee_per_byte.as_nano().saturating_mul(bytes))
    }

    /// Budget that covers a full Init sweep over `ring_size` fresh nodes.
    #[must_use]
    pub fn full_init_budget(&self, ring_size: u32) -> Coins {
        Coins(
            self.init_cost()
                .as_nano()
                .saturating_mul(u64::from(ring_size)),
        )
    }
}
