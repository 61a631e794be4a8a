//! # Storage Ring Benchmarks
//!
//! | Area | What is measured |
//! |------|------------------|
//! | Address derivation | keccak-based node address per index |
//! | Controller | one Init / Clean hop against an in-memory node |
//! | Payload | compaction of logs with shadowed writes |
//! | Relay | a full Init sweep across rings of increasing size |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use ring_storage::prelude::*;
use shared_types::RingEnvelope;
use std::time::Duration;
use uuid::Uuid;

const OWNER: Address = Address::new([0xAA; 20]);
const BUDGET: Coins = Coins::from_nano(1_000_000_000_000);

fn ring(size: u32) -> RingConfig {
    RingConfig::new(RootIdentity::new(b"bench-ring".to_vec()), OWNER, size)
}

// ============================================================================
// Address derivation
// ============================================================================

fn bench_address_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("address-derivation");
    let root = RootIdentity::new(vec![0x5A; 32]);

    group.bench_function("derive_single", |b| {
        b.iter(|| black_box(derive_node_address(&root, black_box(17))))
    });

    for count in [32u32, 256, 1024] {
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::new("derive_ring", count), &count, |b, &count| {
            b.iter(|| {
                for index in 0..count {
                    black_box(derive_node_address(&root, index));
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// Controller
// ============================================================================

fn bench_controller_hops(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller");
    let config = ring(32);
    let controller = RingController::new(&config);

    let init = RingEnvelope::new(
        OWNER,
        config.node_address(0),
        0,
        Uuid::nil(),
        NodeRequest::control(ControlMessage::init(1, 32, BUDGET)),
    );
    group.bench_function("init_hop", |b| {
        b.iter(|| {
            let mut node = Node::new(0, config.node_address(0));
            black_box(controller.handle(&mut node, &init).is_ok())
        })
    });

    let clean = RingEnvelope::new(
        OWNER,
        config.node_address(0),
        0,
        Uuid::nil(),
        NodeRequest::control(ControlMessage::clean(2, 32, BUDGET)),
    );
    let mut populated = Node::new(0, config.node_address(0));
    let _ = controller.handle(&mut populated, &init);
    for key in 0..16u32 {
        for round in 0u8..4 {
            let store = RingEnvelope::new(
                OWNER,
                config.node_address(0),
                0,
                Uuid::nil(),
                NodeRequest::Store(StoreRequest::put(key, vec![round; 32], BUDGET)),
            );
            let _ = controller.handle(&mut populated, &store);
        }
    }
    group.bench_function("clean_hop_64_entries", |b| {
        b.iter(|| {
            let mut node = populated.clone();
            black_box(controller.handle(&mut node, &clean).is_ok())
        })
    });

    group.finish();
}

// ============================================================================
// Payload compaction
// ============================================================================

fn bench_payload_compaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload-compaction");
    let mut rng = rand::thread_rng();

    for writes in [64usize, 512, 4096] {
        let mut payload = Payload::new();
        for _ in 0..writes {
            let key = rng.gen_range(0..(writes as u32 / 4).max(1));
            if rng.gen_bool(0.1) {
                payload.store(key, None);
            } else {
                let len = rng.gen_range(8..64);
                payload.store(key, Some((0..len).map(|_| rng.gen()).collect()));
            }
        }

        group.throughput(Throughput::Elements(writes as u64));
        group.bench_with_input(BenchmarkId::new("compact", writes), &payload, |b, payload| {
            b.iter(|| {
                let mut working = payload.clone();
                black_box(working.compact())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Relay sweeps
// ============================================================================

fn bench_full_init_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay-sweep");
    group.measurement_time(Duration::from_secs(10));
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => panic!("failed to start runtime: {err}"),
    };

    for size in [8u32, 32, 128] {
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("init_sweep", size), &size, |b, &size| {
            b.iter(|| {
                runtime.block_on(async {
                    let (service, _bus) = RingService::in_memory(ring(size), ServiceConfig::default());
                    let _ = service.init_ring(OWNER, 1, BUDGET).await;
                    black_box(service.settle().await.is_ok())
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_address_derivation,
    bench_controller_hops,
    bench_payload_compaction,
    bench_full_init_sweep,
);

criterion_main!(benches);
