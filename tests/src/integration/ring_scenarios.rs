//! # Ring Scenarios
//!
//! Reference behaviour of a 32-node ring:
//!
//! 1. Full Init materializes all 32 nodes at stable addresses
//! 2. Clean strictly shrinks all 32 payloads and marks them cleaned
//! 3. Destroy leaves no material on any of the 32 addresses, and can re-run
//! 4. Init with scope 5 reaches nodes 0..4 only
//!
//! plus the failure paths that stop a sweep part-way.

#[cfg(test)]
mod tests {
    use ring_runtime::{CleanReport, DestroyReport};
    use ring_storage::prelude::*;
    use shared_bus::{EventFilter, EventTopic, RingEvent};
    use shared_types::RingEnvelope;
    use uuid::Uuid;

    use crate::integration::fixtures::*;

    // =============================================================================
    // INIT
    // =============================================================================

    #[tokio::test]
    async fn test_full_init_materializes_every_node() {
        let (service, bus) = service(RING_SIZE);
        let mut sub = bus.subscribe(EventFilter::all());

        let sweep = service.init_ring(OWNER, 7, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        let views = service.scan().await;
        assert_eq!(views.len(), 32);
        for (index, view) in (0u32..).zip(&views) {
            assert_eq!(view.state, LifecycleState::Active);
            assert_eq!(view.owner, Some(OWNER));
            assert_eq!(view.payload, Some(Payload::new()));
            assert_eq!(view.address, service.node_address(index));
        }

        let spent = service.ring().costs.init_cost().as_nano() * 32;
        assert_eq!(
            end,
            RingEvent::SweepCompleted {
                sweep_id: sweep,
                index: 31,
                opcode: Opcode::Init,
                refund: Coins::from_nano(BUDGET.as_nano() - spent),
            }
        );
    }

    #[tokio::test]
    async fn test_node_addresses_are_stable() {
        let (first, _) = service(RING_SIZE);
        let (second, _) = service(RING_SIZE);
        let root = ring(RING_SIZE).root_identity;

        for index in 0..RING_SIZE {
            let expected = derive_node_address(&root, index);
            assert_eq!(first.node_address(index), expected);
            assert_eq!(second.node_address(index), expected);
        }

        init_all(&first).await;
        for index in 0..RING_SIZE {
            assert_eq!(first.node_address(index), derive_node_address(&root, index));
        }
    }

    #[tokio::test]
    async fn test_init_scope_five_stops_at_index_four() {
        let (service, _bus) = service(RING_SIZE);
        service
            .originate(OWNER, 0, ControlMessage::init(1, 5, BUDGET))
            .await
            .unwrap();
        service.settle().await.unwrap();

        let views = service.scan().await;
        for view in &views[..5] {
            assert_eq!(view.state, LifecycleState::Active, "index {}", view.index);
        }
        for view in &views[5..] {
            assert_eq!(view.state, LifecycleState::Uninitialized, "index {}", view.index);
        }
        assert_eq!(service.relay().hosted_nodes(), 5);
    }

    #[tokio::test]
    async fn test_reinit_never_resets_payload() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 3).await;
        let before = service.scan().await;

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));
        let sweep = service.init_ring(OWNER, 2, BUDGET).await.unwrap();
        sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        let after = service.scan().await;
        assert_eq!(before, after);
        assert!(after.iter().all(|view| view.payload.as_ref().is_some_and(|p| p.len() == 6)));
    }

    #[tokio::test]
    async fn test_empty_ring_is_legal() {
        let (service, bus) = service(0);
        let mut sub = bus.subscribe(EventFilter::all());

        let sweep = service.init_ring(OWNER, 1, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;

        assert!(matches!(end, RingEvent::SweepCompleted { index: 0, .. }));
        assert!(service.scan().await.is_empty());
        assert_eq!(service.lifecycle_view(0).await.state, LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn test_init_cannot_enter_mid_ring() {
        let (service, bus) = service(8);
        let mut sub = bus.subscribe(EventFilter::all());

        let sweep = service
            .originate(OWNER, 5, ControlMessage::init(1, 3, BUDGET))
            .await
            .unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        match end {
            RingEvent::SweepHalted { index, opcode, reason, .. } => {
                assert_eq!(index, 5);
                assert_eq!(opcode, Some(Opcode::Init));
                assert!(reason.contains("unauthorized"));
            }
            other => panic!("expected a halt, got {other:?}"),
        }
        assert!(states(&service.scan().await)
            .iter()
            .all(|state| *state == LifecycleState::Uninitialized));
    }

    // =============================================================================
    // CLEAN
    // =============================================================================

    #[tokio::test]
    async fn test_clean_shrinks_every_payload() {
        let (service, _bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 4).await;

        let before = service.scan().await;
        service.clean_ring(OWNER, 3, BUDGET).await.unwrap();
        service.settle().await.unwrap();
        let after = service.scan().await;

        let report = CleanReport::compare(&before, &after);
        assert_eq!(report.rows.len(), 32);
        assert_eq!(report.cleaned(), 32);
        assert!(report.all_shrunk());
        for view in &after {
            assert!(view.payload.as_ref().is_some_and(Payload::is_minimal));
        }
    }

    #[tokio::test]
    async fn test_second_direct_clean_is_rejected_without_mutation() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 2).await;
        service.clean_ring(OWNER, 3, BUDGET).await.unwrap();
        service.settle().await.unwrap();
        let cleaned = service.scan().await;

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service.clean_ring(OWNER, 4, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        match end {
            RingEvent::SweepHalted { index, opcode, reason, .. } => {
                assert_eq!(index, 0);
                assert_eq!(opcode, Some(Opcode::Clean));
                assert!(reason.contains("cannot clean"));
            }
            other => panic!("expected a halt, got {other:?}"),
        }
        assert_eq!(service.scan().await, cleaned);
        // Rejected hops are never billed
        let stats = service.relay().stats();
        assert_eq!(stats.messages_rejected, 1);
    }

    #[tokio::test]
    async fn test_clean_passes_through_uninitialized_tail() {
        let (service, bus) = service(RING_SIZE);
        service
            .originate(OWNER, 0, ControlMessage::init(1, 5, BUDGET))
            .await
            .unwrap();
        service.settle().await.unwrap();

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service.clean_ring(OWNER, 2, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        assert!(matches!(end, RingEvent::SweepCompleted { index: 31, .. }));
        let views = service.scan().await;
        assert!(views[..5].iter().all(|view| view.is_cleaned));
        assert!(views[5..].iter().all(|view| view.state == LifecycleState::Uninitialized));
    }

    #[tokio::test]
    async fn test_clean_single_node_leaves_neighbours() {
        let (service, _bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 1).await;

        service
            .originate(OWNER, 10, ControlMessage::clean(5, 1, BUDGET))
            .await
            .unwrap();
        service.settle().await.unwrap();

        let views = service.scan().await;
        assert!(views[10].is_cleaned);
        assert_eq!(views.iter().filter(|view| view.is_cleaned).count(), 1);
    }

    #[tokio::test]
    async fn test_ring_clean_passes_over_cleaned_node() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 3).await;

        service
            .originate(OWNER, 10, ControlMessage::clean(2, 1, BUDGET))
            .await
            .unwrap();
        service.settle().await.unwrap();
        let single = service.lifecycle_view(10).await;
        assert!(single.is_cleaned);

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service.clean_ring(OWNER, 3, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        assert!(matches!(end, RingEvent::SweepCompleted { index: 31, .. }));
        let views = service.scan().await;
        assert!(views.iter().all(|view| view.is_cleaned));
        assert_eq!(views[10].payload, single.payload);
    }

    // =============================================================================
    // DESTROY
    // =============================================================================

    #[tokio::test]
    async fn test_destroy_clears_every_node() {
        let (service, _bus) = service(RING_SIZE);
        init_all(&service).await;
        populate(&service, 2).await;
        // Half the ring cleaned, half still active
        service
            .originate(OWNER, 0, ControlMessage::clean(1, 16, BUDGET))
            .await
            .unwrap();
        service.settle().await.unwrap();

        let before = service.scan().await;
        service.destroy_ring(OWNER, 2, BUDGET).await.unwrap();
        service.settle().await.unwrap();
        let after = service.scan().await;

        let report = DestroyReport::compare(&before, &after);
        assert!(report.rows.iter().all(|row| row.had_material));
        assert!(report.all_cleared());
        assert!(after.iter().all(|view| view.state == LifecycleState::Destroyed));
        assert!(after.iter().all(|view| view.balance == Coins::ZERO));
    }

    #[tokio::test]
    async fn test_destroy_is_safe_to_rerun() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;
        service.destroy_ring(OWNER, 1, BUDGET).await.unwrap();
        service.settle().await.unwrap();

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service.destroy_ring(OWNER, 2, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        assert!(matches!(end, RingEvent::SweepCompleted { index: 31, .. }));
        assert!(service.scan().await.iter().all(|view| !view.has_material()));
        assert_eq!(service.relay().stats().messages_rejected, 0);
    }

    #[tokio::test]
    async fn test_destroy_refund_returns_deposits() {
        let (service, bus) = service(4);
        init_all(&service).await;

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service.destroy_ring(OWNER, 1, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;

        let costs = service.ring().costs;
        let expected = BUDGET.as_nano() - 4 * costs.destroy_cost().as_nano() + 4 * costs.storage_deposit.as_nano();
        assert!(matches!(end, RingEvent::SweepCompleted { refund, .. } if refund == Coins::from_nano(expected)));
    }

    #[tokio::test]
    async fn test_init_after_destroy_does_not_revive() {
        let (service, _bus) = service(4);
        init_all(&service).await;
        service.destroy_ring(OWNER, 1, BUDGET).await.unwrap();
        service.settle().await.unwrap();

        init_all(&service).await;
        assert!(states(&service.scan().await)
            .iter()
            .all(|state| *state == LifecycleState::Destroyed));
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_budget_exhaustion_halts_midway() {
        let (service, bus) = service(RING_SIZE);
        let per_node = service.ring().costs.init_cost().as_nano();
        let budget = Coins::from_nano(per_node * 3 + per_node / 2);

        let mut sub = bus.subscribe(EventFilter::all());
        let sweep = service
            .originate(OWNER, 0, ControlMessage::init(1, RING_SIZE, budget))
            .await
            .unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        match end {
            RingEvent::SweepHalted { index, reason, .. } => {
                assert_eq!(index, 3);
                assert!(reason.contains("insufficient budget"));
            }
            other => panic!("expected a halt, got {other:?}"),
        }

        let views = service.scan().await;
        assert!(views[..3].iter().all(|view| view.state == LifecycleState::Active));
        assert!(views[3..].iter().all(|view| view.state == LifecycleState::Uninitialized));
        // Index 3 was reached, nothing past it
        assert_eq!(service.relay().hosted_nodes(), 4);
    }

    #[tokio::test]
    async fn test_non_owner_origination_is_rejected() {
        let (service, bus) = service(RING_SIZE);
        let stranger = Address::new([0x42; 20]);

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Halts]));
        let sweep = service.init_ring(stranger, 1, BUDGET).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        assert!(matches!(end, RingEvent::SweepHalted { index: 0, .. }));
        assert!(service.scan().await.iter().all(|view| view.state == LifecycleState::Uninitialized));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_enter_midway() {
        let (service, _bus) = service(RING_SIZE);
        init_all(&service).await;

        // A sibling two hops back is not the predecessor of node 5.
        let envelope = RingEnvelope::new(
            service.node_address(3),
            service.node_address(5),
            5,
            Uuid::new_v4(),
            NodeRequest::control(ControlMessage::destroy(1, 10, BUDGET)),
        );
        service.relay().forward(envelope).await.unwrap();
        service.settle().await.unwrap();

        assert!(service.scan().await.iter().all(|view| view.state == LifecycleState::Active));
        assert_eq!(service.relay().stats().messages_rejected, 1);
    }

    #[tokio::test]
    async fn test_address_mismatch_is_rejected() {
        let (service, bus) = service(RING_SIZE);
        init_all(&service).await;

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Halts]));
        let sweep = Uuid::new_v4();
        // Claims to be for index 4 but carries index 6's address.
        let envelope = RingEnvelope::new(
            OWNER,
            service.node_address(6),
            4,
            sweep,
            NodeRequest::control(ControlMessage::destroy(1, 1, BUDGET)),
        );
        service.relay().forward(envelope).await.unwrap();
        let end = sweep_end(&mut sub, sweep).await;
        service.settle().await.unwrap();

        match end {
            RingEvent::SweepHalted { reason, .. } => assert!(reason.contains("address mismatch")),
            other => panic!("expected a halt, got {other:?}"),
        }
        assert!(service.scan().await.iter().all(|view| view.has_material()));
    }

    #[tokio::test]
    async fn test_misaddressed_message_does_not_claim_node() {
        let (service, _bus) = service(8);

        // Node 6 has never been addressed; the envelope names index 4.
        let envelope = RingEnvelope::new(
            OWNER,
            service.node_address(6),
            4,
            Uuid::new_v4(),
            NodeRequest::control(ControlMessage::destroy(1, 1, BUDGET)),
        );
        service.relay().forward(envelope).await.unwrap();
        service.settle().await.unwrap();
        assert_eq!(service.relay().hosted_nodes(), 0);

        init_all(&service).await;
        assert!(states(&service.scan().await)
            .iter()
            .all(|state| *state == LifecycleState::Active));
        assert_eq!(service.relay().hosted_nodes(), 8);
    }

    #[tokio::test]
    async fn test_store_on_cleaned_node_is_rejected() {
        let (service, bus) = service(2);
        init_all(&service).await;
        service.clean_ring(OWNER, 2, BUDGET).await.unwrap();
        service.settle().await.unwrap();

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Halts]));
        service
            .store(OWNER, 1, StoreRequest::put(1, b"late".to_vec(), BUDGET))
            .await
            .unwrap();

        let event = tokio::time::timeout(EVENT_TIMEOUT, sub.recv()).await.unwrap().unwrap();
        assert!(matches!(event, RingEvent::SweepHalted { index: 1, opcode: None, .. }));
        assert_eq!(service.lifecycle_view(1).await.payload, Some(Payload::new()));
    }
}
