//! Shared setup for the integration scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ring_storage::prelude::*;
use shared_bus::{InMemoryEventBus, RingEvent, Subscription};
use uuid::Uuid;

/// Ring owner in every scenario.
pub const OWNER: Address = Address::new([0xAA; 20]);

/// Size used by the reference scenarios.
pub const RING_SIZE: u32 = 32;

/// Ten coins; enough for any full sweep over `RING_SIZE` nodes.
pub const BUDGET: Coins = Coins::from_nano(10_000_000_000);

/// Upper bound on how long any single event may take to show up.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn ring(size: u32) -> RingConfig {
    RingConfig::new(RootIdentity::new(b"integration-ring".to_vec()), OWNER, size)
}

pub fn service(size: u32) -> (RingService<InMemoryRelay>, Arc<InMemoryEventBus>) {
    RingService::in_memory(ring(size), ServiceConfig::default())
}

/// Full Init sweep, settled.
pub async fn init_all(service: &RingService<InMemoryRelay>) {
    service.init_ring(OWNER, 1, BUDGET).await.unwrap();
    service.settle().await.unwrap();
}

/// Writes every key twice on every node, so each payload has shadowed writes.
pub async fn populate(service: &RingService<InMemoryRelay>, entries: u32) {
    for index in 0..service.ring().ring_size {
        for key in 0..entries {
            for round in 0u8..2 {
                let request = StoreRequest::put(key, vec![round; 24], BUDGET);
                service.store(OWNER, index, request).await.unwrap();
            }
        }
    }
    service.settle().await.unwrap();
}

/// Waits for the event that ends `sweep_id`: completion or halt.
pub async fn sweep_end(sub: &mut Subscription, sweep_id: Uuid) -> RingEvent {
    tokio::time::timeout(EVENT_TIMEOUT, sub.sweep_end(sweep_id))
        .await
        .expect("sweep did not end in time")
        .expect("bus closed")
}

/// Waits until every sweep in `sweep_ids` has ended. Ends are returned in
/// the order of `sweep_ids`, whatever order they arrived in.
pub async fn sweep_ends(sub: &mut Subscription, sweep_ids: &[Uuid]) -> Vec<RingEvent> {
    let mut ends: HashMap<Uuid, RingEvent> = HashMap::new();
    while ends.len() < sweep_ids.len() {
        let event = tokio::time::timeout(EVENT_TIMEOUT, sub.recv())
            .await
            .expect("sweeps did not end in time")
            .expect("bus closed");
        if let Some(sweep_id) = event.sweep_id().filter(|id| event.is_sweep_end() && sweep_ids.contains(id)) {
            ends.insert(sweep_id, event);
        }
    }
    sweep_ids.iter().filter_map(|id| ends.remove(id)).collect()
}

pub fn states(views: &[NodeView]) -> Vec<LifecycleState> {
    views.iter().map(|view| view.state).collect()
}
