//! Observer Port - Engine Event Sink
//!
//! Receives notifications about trades, rejections and settlements
//! so adapters (Prometheus, logs) can record them without the
//! registry knowing about any concrete backend.

use crate::domain::error::EngineError;
use crate::domain::lmsr::TradeOutcome;
use crate::domain::settlement::Settlement;
use crate::domain::trade::MarketId;

/// Sink for engine events. Implementations must be cheap and non-blocking:
/// they are called while the traded market's lock is held.
pub trait TradeObserver: Send + Sync {
  /// A trade was applied to a market.
  fn on_trade(&self, market_id: &MarketId, outcome: &TradeOutcome);

  /// A trade or settlement request was rejected.
  fn on_rejected(&self, error: &EngineError);

  /// A trade was settled at market resolution.
  fn on_settlement(&self, settlement: &Settlement);

  /// The number of registered markets changed.
  fn on_market_count(&self, count: usize);
}
