//! # Ring Runtime
//!
//! Operator binary for a storage ring.
//!
//! ## Run Sequence
//!
//! 1. Load configuration from the environment
//! 2. Check the operator owns the ring
//! 3. Init sweep, then populate every payload
//! 4. Clean sweep, with a before/after size report
//! 5. Destroy sweep, with a before/after material report
//! 6. Shut the relay down

use anyhow::{ensure, Context, Result};
use ring_runtime::{RingDriver, RuntimeConfig};
use ring_storage::service::RingService;
use shared_bus::EventPublisher;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("failed to load configuration")?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Storage Ring Runtime v{}", ring_storage::VERSION);
    info!("===========================================");
    info!(
        ring_size = config.ring_size,
        owner = %config.owner,
        budget = %config.budget,
        "Configuration loaded"
    );

    let (service, bus) = RingService::in_memory(config.ring_config(), config.service_config());
    info!(root = ?service.ring().root_address(), "Ring root address");

    let driver = RingDriver::new(&service, &bus, config.owner, config.budget);
    driver.ensure_owner().await.context("ownership check failed")?;

    let views = driver.init().await.context("init sweep failed")?;
    let active = views.iter().filter(|view| view.has_material()).count();
    ensure!(
        active == views.len(),
        "init materialized {active} of {} nodes",
        views.len()
    );

    driver
        .populate(config.entries_per_node)
        .await
        .context("populating payloads failed")?;

    let clean = driver.clean().await.context("clean sweep failed")?;
    println!("{clean}");
    if !clean.all_shrunk() {
        warn!("Not every payload shrank; re-run Clean on the remaining nodes");
    }

    let destroy = driver.destroy().await.context("destroy sweep failed")?;
    println!("{destroy}");
    println!("{}", serde_json::to_string_pretty(&destroy)?);

    let relay = service.relay();
    let stats = relay.stats();
    info!(
        processed = stats.messages_processed,
        forwarded = stats.messages_forwarded,
        rejected = stats.messages_rejected,
        fees = %stats.fees_charged,
        events = bus.events_published(),
        "Relay statistics"
    );
    relay.shutdown();

    ensure!(
        destroy.all_cleared(),
        "nodes {:?} still hold material",
        destroy.survivors()
    );
    Ok(())
}
