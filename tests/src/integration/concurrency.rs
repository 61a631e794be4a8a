//! # Concurrency
//!
//! Nodes only ever see their own inbox, so overlapping sweeps interleave hop
//! by hop. These scenarios check that overlaps still converge to the same
//! ring state as running the sweeps one after another.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::seq::SliceRandom;
    use rand::Rng;
    use ring_storage::prelude::*;
    use shared_bus::{EventFilter, RingEvent};

    use crate::integration::fixtures::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_init_sweeps_converge() {
        let (service, bus) = service(RING_SIZE);
        let service = Arc::new(service);
        let mut sub = bus.subscribe(EventFilter::all());

        let mut handles = Vec::new();
        for query_id in 0..4u64 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move { service.init_ring(OWNER, query_id, BUDGET).await }));
        }
        let mut sweeps = Vec::new();
        for handle in handles {
            sweeps.push(handle.await.unwrap().unwrap());
        }
        for end in sweep_ends(&mut sub, &sweeps).await {
            assert!(matches!(end, RingEvent::SweepCompleted { index: 31, .. }));
        }
        service.settle().await.unwrap();

        let views = service.scan().await;
        assert!(views.iter().all(|view| view.state == LifecycleState::Active));
        // Exactly one sweep materialized each node, the rest skipped it
        let costs = service.ring().costs;
        assert!(views.iter().all(|view| view.balance == costs.storage_deposit));
        assert_eq!(service.relay().stats().messages_processed, 4 * u64::from(RING_SIZE));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_destroy_sweeps_converge() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 2).await;
        let mut sub = bus.subscribe(EventFilter::all());

        let first = service.destroy_ring(OWNER, 10, BUDGET).await.unwrap();
        let second = service.destroy_ring(OWNER, 11, BUDGET).await.unwrap();
        let ends = sweep_ends(&mut sub, &[first, second]).await;
        service.settle().await.unwrap();

        assert_eq!(ends.len(), 2);
        assert!(ends.iter().all(|end| matches!(end, RingEvent::SweepCompleted { .. })));
        assert!(service.scan().await.iter().all(|view| !view.has_material()));

        // Deposits were reclaimed once in total, split between the two sweeps.
        let refunds: u64 = ends
            .iter()
            .map(|end| match end {
                RingEvent::SweepCompleted { refund, .. } => refund.as_nano(),
                _ => 0,
            })
            .sum();
        let costs = service.ring().costs;
        let n = u64::from(RING_SIZE);
        let expected = 2 * BUDGET.as_nano() - 2 * n * costs.hop_fee.as_nano() + n * costs.storage_deposit.as_nano();
        assert_eq!(refunds, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stores_from_many_tasks_keep_per_node_order() {
        let (service, _bus) = service(8);
        init_all(&service).await;
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for index in 0..8u32 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let rounds = rand::thread_rng().gen_range(5..20u8);
                for round in 0..rounds {
                    let request = StoreRequest::put(0, vec![round], BUDGET);
                    service.store(OWNER, index, request).await.unwrap();
                }
                rounds
            }));
        }

        let mut expected = Vec::new();
        for handle in handles {
            expected.push(handle.await.unwrap());
        }
        service.settle().await.unwrap();

        for (index, rounds) in (0u32..).zip(expected) {
            let view = service.lifecycle_view(index).await;
            let payload = view.payload.unwrap();
            assert_eq!(payload.len(), usize::from(rounds));
            // Last write wins because the inbox is FIFO
            assert_eq!(payload.get(0), Some(&[rounds - 1][..]));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_node_cleans_in_random_order() {
        let (service, _bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 3).await;
        let service = Arc::new(service);

        let mut order: Vec<u32> = (0..RING_SIZE).collect();
        order.shuffle(&mut rand::thread_rng());

        let mut handles = Vec::new();
        for (query_id, index) in (100u64..).zip(order) {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .originate(OWNER, index, ControlMessage::clean(query_id, 1, BUDGET))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        service.settle().await.unwrap();

        let views = service.scan().await;
        assert!(views.iter().all(|view| view.is_cleaned));
        assert!(views
            .iter()
            .all(|view| view.payload.as_ref().is_some_and(|p| p.live_keys() == 3 && p.is_minimal())));
        assert_eq!(service.relay().stats().messages_rejected, 0);
    }
}
