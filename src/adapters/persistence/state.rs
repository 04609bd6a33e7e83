//! State Store - Atomic JSON Market Snapshots
//!
//! Saves market snapshots to `markets.json` using atomic writes
//! (write to tmp file, then rename). The file is always either the
//! old or the new snapshot, never a partial write.
//!
//! Pressures are stored as JSON numbers; serde_json round-trips f64
//! exactly, so a save/load cycle reproduces identical probabilities.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument};

use crate::ports::repository::MarketsSnapshot;

/// Atomic JSON snapshot store.
pub struct StateStore {
    /// Path to markets.json.
    state_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl StateStore {
    /// Create a new state store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            state_path: dir.join("markets.json"),
            tmp_path: dir.join("markets.json.tmp"),
        })
    }

    /// Save a snapshot atomically (tmp → rename).
    #[instrument(skip(self, snapshot), fields(markets = snapshot.markets.len()))]
    pub async fn save(&self, snapshot: &MarketsSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize market snapshot")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;

        fs::rename(&self.tmp_path, &self.state_path)
            .await
            .context("Failed to rename snapshot file")?;

        info!(
            path = %self.state_path.display(),
            version = %snapshot.version,
            "Market snapshot saved"
        );

        Ok(())
    }

    /// Load the most recent snapshot.
    ///
    /// Returns `None` if no snapshot exists (first startup).
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<MarketsSnapshot>> {
        if !fs::try_exists(&self.state_path).await.unwrap_or(false) {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.state_path)
            .await
            .context("Failed to read snapshot file")?;

        let snapshot: MarketsSnapshot =
            serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;

        info!(
            version = %snapshot.version,
            markets = snapshot.markets.len(),
            "Market snapshot loaded"
        );

        Ok(Some(snapshot))
    }

    /// Check that the snapshot directory is still present.
    pub async fn is_healthy(&self) -> bool {
        match self.state_path.parent() {
            Some(dir) => fs::metadata(dir).await.is_ok(),
            None => false,
        }
    }
}
