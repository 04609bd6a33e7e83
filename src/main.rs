//! Samsa LMSR Engine — Entry Point
//!
//! Hosts the market registry as a long-running service. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from the first argument) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create metrics registry and market manager
//! 4. Open file repository, restore the last snapshot
//! 5. Seed configured markets that were not restored
//! 6. Spawn health server, metrics server, snapshot loop, health watchdog
//! 7. Wait for SIGINT → graceful shutdown (not ready → final snapshot → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use samsa_lmsr::adapters::metrics::{EngineMetrics, HealthServer, HealthState};
use samsa_lmsr::adapters::persistence::RepositoryImpl;
use samsa_lmsr::config::{self, AppConfig};
use samsa_lmsr::domain::SettlementCalculator;
use samsa_lmsr::ports::MarketRepository;
use samsa_lmsr::usecases::{MarketManager, SnapshotService};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        markets = config.markets.len(),
        fee = config.engine.platform_fee,
        "Starting Samsa LMSR engine"
    );

    // ── 3. Metrics + market registry ────────────────────────
    let metrics = Arc::new(EngineMetrics::new().context("Failed to register metrics")?);
    let calculator = SettlementCalculator::new(config.engine.platform_fee)
        .context("Invalid platform fee")?;
    let manager = Arc::new(MarketManager::new(calculator).with_observer(metrics.clone()));

    // ── 4. Repository + snapshot restore ────────────────────
    let repo = Arc::new(
        RepositoryImpl::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open data directory")?,
    );
    let snapshots = Arc::new(SnapshotService::new(
        Arc::clone(&manager),
        Arc::clone(&repo),
        Duration::from_secs(config.persistence.snapshot_interval_seconds),
    ));
    snapshots.restore().await.context("Failed to restore market snapshot")?;

    // ── 5. Seed configured markets ──────────────────────────
    seed_markets(&manager, &config)?;

    // ── 6. Spawn background tasks ───────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());

    let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
    let health_handle = tokio::spawn({
        let rx = shutdown_tx.subscribe();
        async move {
            if let Err(e) = health_server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }
    });

    let metrics_handle = config.metrics.enabled.then(|| {
        let rx = shutdown_tx.subscribe();
        let metrics = Arc::clone(&metrics);
        let bind = config.metrics.bind_address.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(bind, rx).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    let snapshot_handle = tokio::spawn({
        let rx = shutdown_tx.subscribe();
        let snapshots = Arc::clone(&snapshots);
        async move { snapshots.run(rx).await }
    });

    let watchdog_handle = tokio::spawn(watch_persistence(
        Arc::clone(&repo),
        Arc::clone(&health),
        shutdown_tx.subscribe(),
    ));

    info!(markets = manager.len(), "All tasks spawned, engine is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    health.begin_shutdown();
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(Duration::from_secs(30), snapshot_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "Final snapshot failed"),
        Ok(Err(e)) => error!(error = %e, "Snapshot task panicked"),
        Err(_) => warn!("Timed out waiting for final snapshot"),
    }

    let _ = tokio::time::timeout(Duration::from_secs(5), watchdog_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;

    info!("Shutdown complete");
    Ok(())
}

/// Create configured markets that the snapshot did not already restore.
fn seed_markets(manager: &MarketManager, config: &AppConfig) -> Result<()> {
    for market in &config.markets {
        let (liquidity, probability) = market.resolve(&config.engine);
        manager
            .get_or_create(&market.id, liquidity, probability)
            .with_context(|| format!("Failed to create market {}", market.id))?;
    }
    Ok(())
}

/// Re-check repository health every 30s and publish it to readiness.
async fn watch_persistence<R: MarketRepository>(
    repo: Arc<R>,
    health: Arc<HealthState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let healthy = repo.is_healthy().await;
        if !healthy {
            warn!("Persistence health check failed");
        }
        health.set_persistence_healthy(healthy);

        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            () = tokio::time::sleep(Duration::from_secs(30)) => {}
        }
    }
}
