//! # In-Memory Relay
//!
//! Hosts the nodes of one ring inside the process. Each node is a Tokio task
//! draining its own unbounded inbox, so a node handles one message at a time
//! and messages from one sender reach it in the order they were sent.
//!
//! ```text
//!  originate ──→ inbox(0) ──→ [node 0] ──forward──→ inbox(1) ──→ [node 1] ──→ …
//!                                │                                  │
//!                                └──────── RingEvent ───────────────┴──→ bus
//! ```
//!
//! A node task is spawned the first time anything is correctly addressed to
//! it. A message whose address does not derive from its index is refused
//! before any task exists. Nothing is spawned for reads: an address that never received a message
//! reads as an uninitialized node.

use crate::domain::controller::{HopOutcome, LocalAction, NodeOutcome, RingController, StoreOutcome};
use crate::domain::entities::{Node, NodeView, RingConfig};
use crate::domain::invariants::{check_all_invariants, check_ownership_invariant, InvariantCheckResult};
use crate::domain::value_objects::{Address, Coins, NodeIndex};
use crate::errors::{RelayError, RingError};
use crate::messages::NodeEnvelope;
use crate::ports::outbound::{MessageRelay, RingObserver};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, RingEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

/// Counters kept by the relay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelayStats {
    /// Messages a node accepted.
    pub messages_processed: u64,
    /// Follow-on hops queued.
    pub messages_forwarded: u64,
    /// Messages a node refused.
    pub messages_rejected: u64,
    /// Sweeps that stopped at a refusing node.
    pub sweeps_halted: u64,
    /// Sweeps whose last hop finished.
    pub sweeps_completed: u64,
    /// Sum of all hop and store charges.
    pub fees_charged: Coins,
}

struct NodeSlot {
    inbox: mpsc::UnboundedSender<NodeEnvelope>,
    node: Arc<Mutex<Node>>,
}

struct RelayInner {
    config: Arc<RingConfig>,
    bus: Arc<dyn EventPublisher>,
    nodes: Mutex<HashMap<Address, NodeSlot>>,
    in_flight: AtomicUsize,
    idle: Notify,
    closed: AtomicBool,
    stats: Mutex<RelayStats>,
}

/// In-process relay for one ring.
#[derive(Clone)]
pub struct InMemoryRelay {
    inner: Arc<RelayInner>,
}

impl InMemoryRelay {
    /// Creates a relay that reports to `bus`.
    #[must_use]
    pub fn new(config: Arc<RingConfig>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                config,
                bus,
                nodes: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                closed: AtomicBool::new(false),
                stats: Mutex::new(RelayStats::default()),
            }),
        }
    }

    /// Ring this relay serves.
    #[must_use]
    pub fn config(&self) -> &RingConfig {
        &self.inner.config
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        self.inner.stats.lock().clone()
    }

    /// Messages queued or being processed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Number of node tasks spawned so far.
    #[must_use]
    pub fn hosted_nodes(&self) -> usize {
        self.inner.nodes.lock().len()
    }

    /// Stops accepting messages and drops every inbox.
    ///
    /// Node tasks finish what is already queued and exit. Their follow-on
    /// hops fail with [`RelayError::Closed`].
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let dropped = {
            let mut nodes = self.inner.nodes.lock();
            let count = nodes.len();
            nodes.clear();
            count
        };
        info!(nodes = dropped, "Relay shut down");
    }

    fn enqueue(&self, envelope: NodeEnvelope) -> Result<(), RelayError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Closed);
        }

        let recipient = envelope.recipient;
        let mut nodes = self.inner.nodes.lock();
        let slot = nodes
            .entry(recipient)
            .or_insert_with(|| self.spawn_node(recipient, envelope.recipient_index));

        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        if slot.inbox.send(envelope).is_err() {
            self.finish_one();
            return Err(RelayError::InboxClosed(recipient));
        }
        Ok(())
    }

    fn spawn_node(&self, address: Address, index: NodeIndex) -> NodeSlot {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let node = Arc::new(Mutex::new(Node::new(index, address)));
        debug!(index, address = %address, "Spawning node task");
        tokio::spawn(run_node(self.clone(), Arc::clone(&node), receiver));
        NodeSlot { inbox, node }
    }

    fn finish_one(&self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }

    async fn process(&self, node: &Mutex<Node>, envelope: NodeEnvelope) {
        let (owner_before, result, owner_after) = {
            let mut guard = node.lock();
            let before = guard.owner();
            let result = RingController::new(&self.inner.config).handle(&mut guard, &envelope);
            (before, result, guard.owner())
        };

        if !check_ownership_invariant(owner_before, owner_after) {
            error!(
                index = envelope.recipient_index,
                before = ?owner_before,
                after = ?owner_after,
                "Node owner changed"
            );
        }

        match result {
            Ok(NodeOutcome::Hop(hop)) => self.after_hop(&envelope, hop).await,
            Ok(NodeOutcome::Stored(stored)) => self.after_store(stored).await,
            Err(err) => self.after_failure(&envelope, err).await,
        }
    }

    async fn after_hop(&self, envelope: &NodeEnvelope, hop: HopOutcome) {
        let config = &self.inner.config;
        let sweep_id = envelope.sweep_id;

        if let Some(Ok(incoming)) = envelope.payload.decode_control() {
            if let InvariantCheckResult::Invalid(violations) = check_all_invariants(config, &incoming, &hop) {
                for violation in violations {
                    error!(index = hop.index, %violation, "Hop invariant violated");
                }
            }
        }

        {
            let mut stats = self.inner.stats.lock();
            stats.messages_processed += 1;
            stats.fees_charged = stats.fees_charged.saturating_add(hop.charged);
        }

        debug!(
            sweep = %sweep_id,
            index = hop.index,
            opcode = %hop.opcode,
            delivery = ?hop.delivery,
            action = ?hop.action,
            residual = %hop.residual,
            "Hop processed"
        );

        let event = match hop.action {
            LocalAction::Materialized { deposit } => RingEvent::NodeMaterialized {
                sweep_id,
                index: hop.index,
                address: config.node_address(hop.index),
                deposit,
            },
            LocalAction::Cleaned {
                size_before,
                size_after,
            } => RingEvent::NodeCleaned {
                sweep_id,
                index: hop.index,
                size_before,
                size_after,
            },
            LocalAction::Destroyed { reclaimed } => RingEvent::NodeDestroyed {
                sweep_id,
                index: hop.index,
                reclaimed,
            },
            LocalAction::Skipped => RingEvent::HopSkipped {
                sweep_id,
                index: hop.index,
                opcode: hop.opcode,
            },
        };
        self.inner.bus.publish(event).await;

        match hop.forward {
            Some(next) => {
                let target = next.recipient_index;
                match MessageRelay::forward(self, next).await {
                    Ok(()) => self.inner.stats.lock().messages_forwarded += 1,
                    Err(err) => {
                        error!(index = hop.index, next = target, error = %err, "Failed to relay hop");
                        self.inner.stats.lock().sweeps_halted += 1;
                        self.inner
                            .bus
                            .publish(RingEvent::SweepHalted {
                                sweep_id,
                                index: target,
                                opcode: Some(hop.opcode),
                                reason: err.to_string(),
                            })
                            .await;
                    }
                }
            }
            None => {
                let refund = hop.residual;
                info!(sweep = %sweep_id, index = hop.index, opcode = %hop.opcode, refund = %refund, "Sweep completed");
                self.inner.stats.lock().sweeps_completed += 1;
                self.inner
                    .bus
                    .publish(RingEvent::SweepCompleted {
                        sweep_id,
                        index: hop.index,
                        opcode: hop.opcode,
                        refund,
                    })
                    .await;
            }
        }
    }

    async fn after_store(&self, stored: StoreOutcome) {
        {
            let mut stats = self.inner.stats.lock();
            stats.messages_processed += 1;
            stats.fees_charged = stats.fees_charged.saturating_add(stored.charged);
        }
        debug!(
            index = stored.index,
            key = stored.key,
            payload_size = stored.payload_size,
            refund = %stored.refund,
            "Entry stored"
        );
        self.inner
            .bus
            .publish(RingEvent::EntryStored {
                index: stored.index,
                key: stored.key,
                payload_size: stored.payload_size,
            })
            .await;
    }

    async fn after_failure(&self, envelope: &NodeEnvelope, err: RingError) {
        let opcode = envelope.payload.opcode();
        warn!(
            sweep = %envelope.sweep_id,
            index = envelope.recipient_index,
            sender = %envelope.sender,
            kind = err.kind(),
            error = %err,
            "Node rejected message"
        );

        {
            let mut stats = self.inner.stats.lock();
            stats.messages_rejected += 1;
            if envelope.payload.is_control() {
                stats.sweeps_halted += 1;
            }
        }

        self.inner
            .bus
            .publish(RingEvent::SweepHalted {
                sweep_id: envelope.sweep_id,
                index: envelope.recipient_index,
                opcode,
                reason: err.to_string(),
            })
            .await;
    }
}

async fn run_node(relay: InMemoryRelay, node: Arc<Mutex<Node>>, mut inbox: mpsc::UnboundedReceiver<NodeEnvelope>) {
    while let Some(envelope) = inbox.recv().await {
        relay.process(&node, envelope).await;
        relay.finish_one();
    }
}

#[async_trait]
impl MessageRelay for InMemoryRelay {
    async fn forward(&self, envelope: NodeEnvelope) -> Result<(), RelayError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Closed);
        }

        let expected = self.inner.config.node_address(envelope.recipient_index);
        if expected != envelope.recipient {
            let err = RingError::AddressMismatch {
                expected,
                actual: envelope.recipient,
            };
            self.after_failure(&envelope, err).await;
            return Ok(());
        }

        self.enqueue(envelope)
    }
}

#[async_trait]
impl RingObserver for InMemoryRelay {
    async fn view(&self, index: NodeIndex) -> NodeView {
        let address = self.inner.config.node_address(index);
        let hosted = self
            .inner
            .nodes
            .lock()
            .get(&address)
            .map(|slot| Arc::clone(&slot.node));

        match hosted {
            Some(node) => node.lock().view(),
            None => Node::new(index, address).view(),
        }
    }

    async fn wait_idle(&self, limit: Duration) -> Result<(), RelayError> {
        let settled = tokio::time::timeout(limit, async {
            loop {
                let notified = self.inner.idle.notified();
                if self.in_flight() == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await;

        settled.map_err(|_| RelayError::IdleTimeout {
            waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            pending: self.in_flight(),
        })
    }
}
