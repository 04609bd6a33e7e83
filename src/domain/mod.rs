//! Domain layer - Core pricing and settlement logic.
//!
//! Pure, synchronous and I/O-free (hexagonal architecture inner ring).
//! Callers that share a market across threads must serialize access; the
//! registry in `usecases::market_manager` does this with a lock per market.

pub mod error;
pub mod lmsr;
pub mod numeric;
pub mod settlement;
pub mod trade;

// Re-export core types for convenience
pub use error::{EngineError, EngineResult};
pub use lmsr::{
    max_log_odds, InverseCheck, Market, MarketState, MarketSummary, TradeOutcome, MAX_LOG_ODDS,
};
pub use settlement::{
    settle_trade, trade_breakdown, Outcome, Payout, Settlement, SettlementCalculator,
    TradeBreakdown,
};
pub use trade::{MarketId, Side};
