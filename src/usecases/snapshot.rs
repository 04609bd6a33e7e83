//! Snapshot Use Case - Periodic Persistence of Market State
//!
//! The registry lives in memory. This service bridges it to a
//! `MarketRepository`:
//! 1. Restore the last snapshot at startup
//! 2. Snapshot all markets every `interval`
//! 3. Take a final snapshot on shutdown
//! 4. Append applied trades to the audit log

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

use crate::ports::repository::{MarketRepository, MarketsSnapshot};
use crate::usecases::market_manager::{Investment, MarketManager};

/// Periodically persists the registry through a repository.
pub struct SnapshotService<R: MarketRepository> {
  manager: Arc<MarketManager>,
  repo: Arc<R>,
  /// Time between snapshots.
  interval: Duration,
}

impl<R: MarketRepository> SnapshotService<R> {
  /// Create a new snapshot service.
  pub fn new(manager: Arc<MarketManager>, repo: Arc<R>, interval: Duration) -> Self {
    Self {
      manager,
      repo,
      interval,
    }
  }

  /// Load the latest snapshot into the registry.
  ///
  /// Returns the number of markets restored (0 on first start).
  #[instrument(skip(self))]
  pub async fn restore(&self) -> Result<usize> {
    let Some(snapshot) = self.repo.load_states().await? else {
      info!("No market snapshot found, starting empty");
      return Ok(0);
    };

    let restored = self
      .manager
      .restore_states(snapshot.markets)
      .context("Snapshot contained an invalid market state")?;

    info!(
      restored,
      snapshot_ms = snapshot.timestamp_ms,
      "Markets restored from snapshot"
    );
    Ok(restored)
  }

  /// Persist the current state of every market.
  #[instrument(skip(self))]
  pub async fn snapshot(&self) -> Result<usize> {
    let snapshot = MarketsSnapshot::new(self.manager.get_all_states());
    let count = snapshot.markets.len();
    self
      .repo
      .save_states(&snapshot)
      .await
      .context("Failed to save market snapshot")?;
    Ok(count)
  }

  /// Append an applied trade to the audit log.
  ///
  /// The engine binary has no trade intake of its own; whatever front end
  /// embeds the library calls this after each successful
  /// `MarketManager::invest`.
  pub async fn record_investment(&self, investment: &Investment) -> Result<()> {
    self.repo.append_trade(&investment.to_record()).await
  }

  /// Snapshot on every tick until shutdown, then once more.
  ///
  /// A failed periodic snapshot is logged and retried on the next tick;
  /// a failed final snapshot is returned to the caller.
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    let mut ticker = tokio::time::interval(self.interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Snapshot service received shutdown signal");
          break;
        }
        _ = ticker.tick() => {
          if let Err(e) = self.snapshot().await {
            error!(error = %e, "Periodic snapshot failed");
          }
        }
      }
    }

    let count = self.snapshot().await?;
    info!(markets = count, "Final snapshot saved");
    Ok(())
  }
}
