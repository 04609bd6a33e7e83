//! Repository Implementation — Concrete Adapter for the Repository Port
//!
//! Wraps `StateStore` (atomic JSON snapshots) and `TradeLogger` (JSONL
//! append-only files) into a single struct that implements
//! `MarketRepository`.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::state::StateStore;
use super::trades::TradeLogger;
use crate::ports::repository::{MarketRepository, MarketsSnapshot, TradeRecord};

/// File-backed repository combining snapshots and the trade log.
pub struct RepositoryImpl {
    /// Atomic JSON state store.
    state_store: StateStore,
    /// JSONL trade logger.
    trade_logger: TradeLogger,
}

impl RepositoryImpl {
    /// Create a new repository from existing store and logger instances.
    pub fn new(state_store: StateStore, trade_logger: TradeLogger) -> Self {
        Self {
            state_store,
            trade_logger,
        }
    }

    /// Create a repository rooted at a data directory.
    pub async fn from_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let state_store = StateStore::new(data_dir.as_ref()).await?;
        let trade_logger = TradeLogger::new(data_dir.as_ref()).await?;
        Ok(Self::new(state_store, trade_logger))
    }
}

#[async_trait]
impl MarketRepository for RepositoryImpl {
    async fn save_states(&self, snapshot: &MarketsSnapshot) -> Result<()> {
        self.state_store.save(snapshot).await
    }

    async fn load_states(&self) -> Result<Option<MarketsSnapshot>> {
        self.state_store.load().await
    }

    async fn append_trade(&self, record: &TradeRecord) -> Result<()> {
        self.trade_logger.append_trade(record).await
    }

    async fn load_trades(&self) -> Result<Vec<TradeRecord>> {
        self.trade_logger.load_all_trades().await
    }

    async fn is_healthy(&self) -> bool {
        self.state_store.is_healthy().await && self.trade_logger.is_healthy().await
    }
}
