//! # Ring Driver
//!
//! The owner's side of a ring: verify ownership, then send sweeps and read the
//! ring back. Sweeps send no reply, so the driver watches the event bus for
//! the sweep's last event and then re-scans the ring.

use crate::report::{CleanReport, DestroyReport};
use ring_storage::domain::entities::{LifecycleState, NodeView};
use ring_storage::domain::value_objects::{Address, Coins, NodeIndex, QueryId};
use ring_storage::errors::RelayError;
use ring_storage::messages::{ControlMessage, StoreRequest};
use ring_storage::ports::inbound::RingApi;
use ring_storage::ports::outbound::{MessageRelay, RingObserver};
use ring_storage::service::RingService;
use shared_bus::{EventFilter, InMemoryEventBus, RingEvent, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Driver failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The ring belongs to someone else.
    #[error("node {index} is owned by {owner:?}, not {operator:?}")]
    NotOwner {
        /// Node checked.
        index: NodeIndex,
        /// Its recorded owner.
        owner: Address,
        /// Who is running the driver.
        operator: Address,
    },

    /// A node refused the sweep; nodes past it were not visited.
    #[error("sweep halted at node {index}: {reason}")]
    Halted {
        /// Refusing node.
        index: NodeIndex,
        /// Reason the node gave.
        reason: String,
    },

    /// No end event arrived for the sweep in time.
    #[error("sweep {sweep_id} did not finish")]
    Unfinished {
        /// Sweep waited on.
        sweep_id: Uuid,
    },

    /// The relay refused a message.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Result of asking a single node to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClean {
    /// Clean request sent.
    Sent,
    /// Node already reports cleaned; nothing was sent.
    AlreadyCleaned,
}

/// Owner-side operations over one ring.
pub struct RingDriver<'a, R: MessageRelay + RingObserver> {
    service: &'a RingService<R>,
    events: &'a InMemoryEventBus,
    operator: Address,
    budget: Coins,
    next_query: AtomicU64,
}

impl<'a, R: MessageRelay + RingObserver> RingDriver<'a, R> {
    /// Creates a driver acting as `operator`, attaching `budget` to every
    /// message. `events` must be the bus the service's relay reports to.
    pub fn new(service: &'a RingService<R>, events: &'a InMemoryEventBus, operator: Address, budget: Coins) -> Self {
        Self {
            service,
            events,
            operator,
            budget,
            next_query: AtomicU64::new(1),
        }
    }

    fn query_id(&self) -> QueryId {
        self.next_query.fetch_add(1, Ordering::Relaxed)
    }

    /// Waits for the end of `sweep_id` on `sub`, then for the relay to drain.
    async fn finish(&self, mut sub: Subscription, sweep_id: Uuid) -> Result<(), DriverError> {
        let end = tokio::time::timeout(self.service.idle_timeout(), sub.sweep_end(sweep_id))
            .await
            .ok()
            .flatten();
        match end {
            Some(RingEvent::SweepHalted { index, reason, .. }) => {
                warn!(sweep = %sweep_id, index, %reason, "Sweep halted");
                Err(DriverError::Halted { index, reason })
            }
            Some(event) => {
                debug!(sweep = %sweep_id, index = event.index(), "Sweep finished");
                self.service.settle().await?;
                Ok(())
            }
            None => Err(DriverError::Unfinished { sweep_id }),
        }
    }

    /// Checks that the operator owns the ring before anything is sent.
    ///
    /// A root that was never materialized has no recorded owner, so the ring
    /// configuration's owner is checked instead.
    pub async fn ensure_owner(&self) -> Result<(), DriverError> {
        let owner = self
            .service
            .lifecycle_view(0)
            .await
            .owner
            .unwrap_or(self.service.ring().owner);
        if owner == self.operator {
            Ok(())
        } else {
            Err(DriverError::NotOwner {
                index: 0,
                owner,
                operator: self.operator,
            })
        }
    }

    /// Materializes the whole ring and returns the post-sweep scan.
    pub async fn init(&self) -> Result<Vec<NodeView>, DriverError> {
        let ring = self.service.ring();
        let needed = ring.costs.full_init_budget(ring.ring_size);
        if self.budget < needed {
            warn!(budget = %self.budget, needed = %needed, "Budget will not cover a full init sweep");
        }
        let sub = self.events.subscribe(EventFilter::all());
        let sweep_id = self.service.init_ring(self.operator, self.query_id(), self.budget).await?;
        self.finish(sub, sweep_id).await?;
        let views = self.service.scan().await;
        let active = views.iter().filter(|v| v.state == LifecycleState::Active).count();
        info!(active, ring_size = views.len(), "Init sweep settled");
        Ok(views)
    }

    /// Writes `entries` keys to every node, each one twice, so the payloads
    /// carry shadowed writes for Clean to fold away.
    pub async fn populate(&self, entries: u32) -> Result<(), DriverError> {
        for index in 0..self.service.ring().ring_size {
            for key in 0..entries {
                for round in 0u8..2 {
                    let value = format!("node-{index}-key-{key}-v{round}").into_bytes();
                    self.service
                        .store(self.operator, index, StoreRequest::put(key, value, self.budget))
                        .await?;
                }
            }
        }
        self.service.settle().await?;
        info!(entries, "Payloads populated");
        Ok(())
    }

    /// Cleans the whole ring from the root and compares payload sizes.
    pub async fn clean(&self) -> Result<CleanReport, DriverError> {
        let before = self.service.scan().await;
        let sub = self.events.subscribe(EventFilter::all());
        let sweep_id = self.service.clean_ring(self.operator, self.query_id(), self.budget).await?;
        self.finish(sub, sweep_id).await?;
        let report = CleanReport::compare(&before, &self.service.scan().await);
        info!(cleaned = report.cleaned(), shrunk = report.shrunk(), "Clean sweep settled");
        Ok(report)
    }

    /// Cleans a single node, unless it already reports cleaned.
    pub async fn clean_item(&self, index: NodeIndex) -> Result<ItemClean, DriverError> {
        if self.service.lifecycle_view(index).await.is_cleaned {
            warn!(index, "Item is already cleaned");
            return Ok(ItemClean::AlreadyCleaned);
        }
        let message = ControlMessage::clean(self.query_id(), 1, self.budget);
        let sub = self.events.subscribe(EventFilter::from_indices(vec![index]));
        let sweep_id = self.service.originate(self.operator, index, message).await?;
        self.finish(sub, sweep_id).await?;
        Ok(ItemClean::Sent)
    }

    /// Destroys the whole ring from the root and compares node material.
    pub async fn destroy(&self) -> Result<DestroyReport, DriverError> {
        let before = self.service.scan().await;
        let sub = self.events.subscribe(EventFilter::all());
        let sweep_id = self.service.destroy_ring(self.operator, self.query_id(), self.budget).await?;
        self.finish(sub, sweep_id).await?;
        let report = DestroyReport::compare(&before, &self.service.scan().await);
        info!(survivors = report.survivors().len(), "Destroy sweep settled");
        Ok(report)
    }
}
