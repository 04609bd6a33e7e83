//! Market Manager - Keyed Registry of LMSR Markets
//!
//! Owns every market by identifier and routes trades to them:
//! - Markets are created lazily on first `get_or_create`
//! - Trades require an existing market (`MarketNotFound` otherwise)
//! - Each market sits behind its own mutex, so concurrent trades on
//!   one market are serialized while different markets trade in parallel
//! - Bulk export/restore of exact pressures for persistence

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::lmsr::{Market, MarketState, MarketSummary};
use crate::domain::settlement::{Settlement, SettlementCalculator, TradeBreakdown};
use crate::domain::trade::{MarketId, Side};
use crate::ports::observer::TradeObserver;
use crate::ports::repository::TradeRecord;

/// Shared handle to a registered market.
pub type MarketHandle = Arc<Mutex<Market>>;

/// Composite result of an investment through the registry.
#[derive(Debug, Clone, Serialize)]
pub struct Investment {
  pub market_id: MarketId,
  pub side: Side,
  pub stake: f64,
  /// Probability before the trade.
  pub old_probability: f64,
  /// Reported probability after the trade, clamped to [0.01, 0.99].
  pub new_probability: f64,
  /// Pressure added to the traded side.
  pub delta_q: f64,
  /// Exact (unclamped) probability change.
  pub delta_p: f64,
  /// First-order preview computed before the trade was applied.
  pub estimated_delta_p: f64,
  /// Settlement breakdown at the pre-trade probability of `side`.
  pub breakdown: TradeBreakdown,
  /// Market state after the trade.
  pub market: MarketSummary,
}

impl Investment {
  /// Audit record for the trade log.
  pub fn to_record(&self) -> TradeRecord {
    TradeRecord {
      id: uuid::Uuid::new_v4().to_string(),
      market_id: self.market_id.clone(),
      side: self.side,
      stake: self.stake,
      old_probability: self.old_probability,
      new_probability: self.new_probability,
      delta_q: self.delta_q,
      timestamp_ms: chrono::Utc::now().timestamp_millis(),
    }
  }
}

/// Registry of markets keyed by identifier.
///
/// Constructed explicitly and passed to whoever needs it; there is no
/// process-wide instance.
pub struct MarketManager {
  /// Registered markets.
  markets: RwLock<HashMap<MarketId, MarketHandle>>,
  /// Settlement calculator bound to the platform fee.
  calculator: SettlementCalculator,
  /// Optional event sink.
  observer: Option<Arc<dyn TradeObserver>>,
}

impl MarketManager {
  /// Create an empty registry settling with the given calculator.
  pub fn new(calculator: SettlementCalculator) -> Self {
    Self {
      markets: RwLock::new(HashMap::new()),
      calculator,
      observer: None,
    }
  }

  /// Attach an event sink.
  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn TradeObserver>) -> Self {
    self.observer = Some(observer);
    self
  }

  /// The settlement calculator used for breakdowns and settlements.
  pub const fn calculator(&self) -> &SettlementCalculator {
    &self.calculator
  }

  /// Return the market for `market_id`, creating it if absent.
  ///
  /// `liquidity` and `initial_probability` are only used (and validated)
  /// when the market is created; later calls ignore them.
  pub fn get_or_create(
    &self,
    market_id: &str,
    liquidity: f64,
    initial_probability: f64,
  ) -> EngineResult<MarketHandle> {
    if let Some(handle) = self.markets.read().get(market_id) {
      return Ok(Arc::clone(handle));
    }

    let mut markets = self.markets.write();
    // Another caller may have created it between the two locks.
    if let Some(handle) = markets.get(market_id) {
      return Ok(Arc::clone(handle));
    }

    let market = Market::new(liquidity, initial_probability)?;
    info!(
      market_id = %market_id,
      liquidity,
      probability = market.probability(),
      "Market created"
    );
    let handle = Arc::new(Mutex::new(market));
    markets.insert(market_id.to_string(), Arc::clone(&handle));
    let count = markets.len();
    drop(markets);

    self.notify(|o| o.on_market_count(count));
    Ok(handle)
  }

  /// Look up an existing market.
  pub fn get_market(&self, market_id: &str) -> EngineResult<MarketHandle> {
    self
      .markets
      .read()
      .get(market_id)
      .map(Arc::clone)
      .ok_or_else(|| EngineError::MarketNotFound(market_id.to_string()))
  }

  /// Current YES probability of an existing market.
  pub fn probability(&self, market_id: &str) -> EngineResult<f64> {
    Ok(self.get_market(market_id)?.lock().probability())
  }

  /// Apply a trade to an existing market.
  ///
  /// The preview and the settlement breakdown are computed at the
  /// pre-trade probability, before anything is written.
  pub fn invest(&self, market_id: &str, side: Side, stake: f64) -> EngineResult<Investment> {
    let result = self.invest_inner(market_id, side, stake);
    if let Err(e) = &result {
      warn!(market_id = %market_id, %side, stake, error = %e, "Trade rejected");
      self.notify(|o| o.on_rejected(e));
    }
    result
  }

  fn invest_inner(&self, market_id: &str, side: Side, stake: f64) -> EngineResult<Investment> {
    let handle = self.get_market(market_id)?;
    let mut market = handle.lock();

    let old_probability = market.probability();
    let estimated_delta_p = market.estimate_probability_change(side, stake)?;
    let breakdown = self
      .calculator
      .breakdown(stake, side.probability_of(old_probability))?;
    let outcome = market.apply_trade(side, stake)?;
    let market_id = market_id.to_string();

    debug!(
      market_id = %market_id,
      %side,
      stake,
      old_probability,
      new_probability = outcome.new_probability,
      delta_q = outcome.delta_q,
      "Trade applied"
    );
    self.notify(|o| o.on_trade(&market_id, &outcome));

    Ok(Investment {
      market_id,
      side,
      stake: outcome.stake,
      old_probability,
      new_probability: outcome.new_probability,
      delta_q: outcome.delta_q,
      delta_p: outcome.delta_p,
      estimated_delta_p,
      breakdown,
      market: market.summary(),
    })
  }

  /// Settle one prediction at resolution time with the configured fee.
  pub fn settle(&self, stake: f64, probability: f64, won: bool) -> EngineResult<Settlement> {
    match self.calculator.settle(stake, probability, won) {
      Ok(settlement) => {
        self.notify(|o| o.on_settlement(&settlement));
        Ok(settlement)
      }
      Err(e) => {
        self.notify(|o| o.on_rejected(&e));
        Err(e)
      }
    }
  }

  /// Export the exact state of every market.
  pub fn get_all_states(&self) -> HashMap<MarketId, MarketState> {
    self
      .markets
      .read()
      .iter()
      .map(|(id, handle)| (id.clone(), handle.lock().state()))
      .collect()
  }

  /// Export state plus derived probability for every market.
  pub fn summaries(&self) -> HashMap<MarketId, MarketSummary> {
    self
      .markets
      .read()
      .iter()
      .map(|(id, handle)| (id.clone(), handle.lock().summary()))
      .collect()
  }

  /// Rebuild markets from exported states, replacing same-id entries.
  ///
  /// All states are validated first; if any is invalid nothing is
  /// restored. Returns the number of markets restored.
  pub fn restore_states(&self, states: HashMap<MarketId, MarketState>) -> EngineResult<usize> {
    let rebuilt = states
      .into_iter()
      .map(|(id, state)| Market::from_state(state).map(|m| (id, m)))
      .collect::<EngineResult<Vec<_>>>()?;

    let restored = rebuilt.len();
    let mut markets = self.markets.write();
    for (id, market) in rebuilt {
      markets.insert(id, Arc::new(Mutex::new(market)));
    }
    let count = markets.len();
    drop(markets);

    info!(restored, total = count, "Market states restored");
    self.notify(|o| o.on_market_count(count));
    Ok(restored)
  }

  /// Registered market identifiers, sorted.
  pub fn market_ids(&self) -> Vec<MarketId> {
    let mut ids: Vec<MarketId> = self.markets.read().keys().cloned().collect();
    ids.sort();
    ids
  }

  pub fn len(&self) -> usize {
    self.markets.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.markets.read().is_empty()
  }

  fn notify(&self, f: impl FnOnce(&dyn TradeObserver)) {
    if let Some(observer) = &self.observer {
      f(observer.as_ref());
    }
  }
}

impl Default for MarketManager {
  fn default() -> Self {
    Self::new(SettlementCalculator::default())
  }
}
