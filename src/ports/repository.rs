//! Repository Port - Market State Persistence Interface
//!
//! The engine keeps market state in memory only. This port is how the
//! surrounding service snapshots that state to durable storage and
//! appends an audit trail of applied trades.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::lmsr::MarketState;
use crate::domain::trade::{MarketId, Side};

/// Snapshot of every market's exact pricing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketsSnapshot {
  /// Version of the snapshot format.
  pub version: String,
  /// Timestamp of snapshot (Unix ms).
  pub timestamp_ms: i64,
  /// Exported state per market.
  pub markets: HashMap<MarketId, MarketState>,
}

impl MarketsSnapshot {
  /// Current snapshot format version.
  pub const VERSION: &'static str = "1";

  /// Wrap exported states in a snapshot stamped with the current time.
  pub fn new(markets: HashMap<MarketId, MarketState>) -> Self {
    Self {
      version: Self::VERSION.to_string(),
      timestamp_ms: chrono::Utc::now().timestamp_millis(),
      markets,
    }
  }
}

/// A single applied trade, for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
  /// Unique trade identifier.
  pub id: String,
  /// Market the trade was applied to.
  pub market_id: MarketId,
  /// Traded side.
  pub side: Side,
  /// Stake in dollars.
  pub stake: f64,
  /// Probability before the trade.
  pub old_probability: f64,
  /// Reported (clamped) probability after the trade.
  pub new_probability: f64,
  /// Pressure added to the traded side.
  pub delta_q: f64,
  /// Timestamp (Unix ms).
  pub timestamp_ms: i64,
}

/// Trait for market state persistence providers.
#[async_trait]
pub trait MarketRepository: Send + Sync + 'static {
  /// Persist a full snapshot, replacing the previous one.
  async fn save_states(&self, snapshot: &MarketsSnapshot) -> anyhow::Result<()>;

  /// Load the most recent snapshot, if any.
  async fn load_states(&self) -> anyhow::Result<Option<MarketsSnapshot>>;

  /// Append a trade record to the audit log.
  async fn append_trade(&self, record: &TradeRecord) -> anyhow::Result<()>;

  /// Load all trade records, oldest first.
  async fn load_trades(&self) -> anyhow::Result<Vec<TradeRecord>>;

  /// Check if the repository is healthy (directory present and writable).
  async fn is_healthy(&self) -> bool;
}
