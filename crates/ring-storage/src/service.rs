//! # Ring Service
//!
//! Operator entry point for one ring. Wraps a relay, stamps every origination
//! with a fresh sweep id, and offers whole-ring helpers on top of the
//! [`RingApi`] port.
//!
//! The service never waits for a sweep as part of the protocol. `settle`
//! exists for drivers that want to re-scan the ring once the relay is quiet.

use crate::adapters::InMemoryRelay;
use crate::domain::entities::{NodeView, RingConfig};
use crate::domain::value_objects::{Address, Coins, NodeIndex, QueryId, RootIdentity};
use crate::errors::RelayError;
use crate::messages::{ControlMessage, NodeRequest, StoreRequest};
use crate::ports::inbound::RingApi;
use crate::ports::outbound::{MessageRelay, RingObserver};

use async_trait::async_trait;
use shared_bus::{InMemoryEventBus, DEFAULT_CHANNEL_CAPACITY};
use shared_types::RingEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Ring service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How long `settle` waits for the relay to go quiet.
    pub idle_timeout_ms: u64,
    /// Event bus capacity used by [`RingService::in_memory`].
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 5000,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// What the service itself has sent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Control messages originated.
    pub sweeps_originated: u64,
    /// Store requests sent.
    pub stores_sent: u64,
    /// Messages the relay refused to queue.
    pub relay_failures: u64,
    /// Budget attached to everything sent.
    pub budget_attached: Coins,
}

/// Operator-side handle on one ring.
pub struct RingService<R: MessageRelay + RingObserver> {
    ring: Arc<RingConfig>,
    config: ServiceConfig,
    relay: Arc<R>,
    stats: Arc<RwLock<ServiceStats>>,
}

impl RingService<InMemoryRelay> {
    /// Builds a service on an in-process relay with its own event bus.
    #[must_use]
    pub fn in_memory(ring: RingConfig, config: ServiceConfig) -> (Self, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_capacity));
        let ring = Arc::new(ring);
        let relay = InMemoryRelay::new(Arc::clone(&ring), bus.clone());
        (Self::new(ring, relay, config), bus)
    }
}

impl<R: MessageRelay + RingObserver> RingService<R> {
    /// Creates a service over `relay`.
    pub fn new(ring: Arc<RingConfig>, relay: R, config: ServiceConfig) -> Self {
        Self {
            ring,
            config,
            relay: Arc::new(relay),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Ring configuration.
    #[must_use]
    pub fn ring(&self) -> &RingConfig {
        &self.ring
    }

    /// Underlying relay.
    #[must_use]
    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Init sweep over the whole ring, entering at the root.
    pub async fn init_ring(&self, requester: Address, query_id: QueryId, budget: Coins) -> Result<Uuid, RelayError> {
        let message = ControlMessage::init(query_id, self.ring.ring_size, budget);
        self.originate(requester, 0, message).await
    }

    /// Clean sweep over the whole ring, entering at the root.
    pub async fn clean_ring(&self, requester: Address, query_id: QueryId, budget: Coins) -> Result<Uuid, RelayError> {
        let message = ControlMessage::clean(query_id, self.ring.ring_size, budget);
        self.originate(requester, 0, message).await
    }

    /// Destroy sweep over the whole ring, entering at the root.
    pub async fn destroy_ring(&self, requester: Address, query_id: QueryId, budget: Coins) -> Result<Uuid, RelayError> {
        let message = ControlMessage::destroy(query_id, self.ring.ring_size, budget);
        self.originate(requester, 0, message).await
    }

    /// Reads every node of the ring, in index order.
    pub async fn scan(&self) -> Vec<NodeView> {
        let mut views = Vec::with_capacity(self.ring.ring_size as usize);
        for index in 0..self.ring.ring_size {
            views.push(self.relay.view(index).await);
        }
        views
    }

    /// How long the service waits for the relay to go quiet.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.config.idle_timeout_ms)
    }

    /// Waits for the relay to go quiet, up to the configured timeout.
    pub async fn settle(&self) -> Result<(), RelayError> {
        self.relay.wait_idle(self.idle_timeout()).await
    }

    async fn send(&self, requester: Address, index: NodeIndex, request: NodeRequest) -> Result<Uuid, RelayError> {
        let sweep_id = Uuid::new_v4();
        let budget = request.budget();
        let envelope = RingEnvelope::new(requester, self.ring.node_address(index), index, sweep_id, request);

        let queued = self.relay.forward(envelope).await;
        let mut stats = self.stats.write().await;
        match &queued {
            Ok(()) => stats.budget_attached = stats.budget_attached.saturating_add(budget),
            Err(err) => {
                warn!(index, error = %err, "Relay refused message");
                stats.relay_failures += 1;
            }
        }
        queued.map(|()| sweep_id)
    }
}

#[async_trait]
impl<R: MessageRelay + RingObserver> RingApi for RingService<R> {
    #[instrument(skip(self, message), fields(query_id = message.query_id, opcode = %message.opcode))]
    async fn originate(
        &self,
        requester: Address,
        index: NodeIndex,
        message: ControlMessage,
    ) -> Result<Uuid, RelayError> {
        info!(
            index,
            scope = message.scope_remaining,
            budget = %message.budget,
            "Originating sweep"
        );
        let sweep_id = self.send(requester, index, NodeRequest::control(message)).await?;
        self.stats.write().await.sweeps_originated += 1;
        debug!(sweep = %sweep_id, "Sweep queued");
        Ok(sweep_id)
    }

    #[instrument(skip(self, request), fields(key = request.key))]
    async fn store(
        &self,
        requester: Address,
        index: NodeIndex,
        request: StoreRequest,
    ) -> Result<(), RelayError> {
        debug!(index, tombstone = request.value.is_none(), "Sending store request");
        self.send(requester, index, NodeRequest::Store(request)).await?;
        self.stats.write().await.stores_sent += 1;
        Ok(())
    }

    async fn lifecycle_view(&self, index: NodeIndex) -> NodeView {
        self.relay.view(index).await
    }

    fn node_address(&self, index: NodeIndex) -> Address {
        self.ring.node_address(index)
    }
}

/// Create a service over an in-memory relay (for testing).
///
/// The ring uses the default cost schedule and owner `0xAA..AA`.
#[must_use]
pub fn create_test_service(ring_size: u32) -> (RingService<InMemoryRelay>, Arc<InMemoryEventBus>) {
    let ring = RingConfig::new(
        RootIdentity::new(b"test-ring".to_vec()),
        TEST_OWNER,
        ring_size,
    );
    RingService::in_memory(ring, ServiceConfig::default())
}

/// Owner used by [`create_test_service`].
pub const TEST_OWNER: Address = Address::new([0xAA; 20]);
