//! Engine error taxonomy.
//!
//! Every variant is a local validation failure: the caller supplied bad
//! data and retrying with the same input yields the same error.

use thiserror::Error;

use super::trade::MarketId;

/// Errors returned by the pricing engine, settlement calculator and
/// market registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Stake was zero, negative, or not a finite number.
    #[error("invalid stake {0}: must be a finite amount greater than zero")]
    InvalidStake(f64),

    /// Probability was NaN or outside [0, 1] after percentage normalization.
    #[error("invalid probability {0}: must lie in [0, 1] (or [0, 100] as a percentage)")]
    InvalidProbability(f64),

    /// Fee fraction was NaN or outside [0, 1].
    #[error("invalid fee {0}: must be a fraction in [0, 1]")]
    InvalidFee(f64),

    /// Liquidity parameter was zero, negative, or not finite.
    #[error("invalid liquidity parameter {0}: must be finite, greater than zero and at most 1e9")]
    InvalidLiquidity(f64),

    /// No market is registered under the given identifier.
    #[error("market {0} not found")]
    MarketNotFound(MarketId),

    /// The trade would push the market's log-odds past the supported range.
    #[error("trade rejected: log-odds {log_odds:.3} would exceed limit {limit}")]
    PressureLimit { log_odds: f64, limit: f64 },

    /// A restored state snapshot carried non-finite pressures.
    #[error("invalid market state: {0}")]
    InvalidState(String),
}

impl EngineError {
    /// Short machine-readable label, used as a metrics label value.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidStake(_) => "invalid_stake",
            Self::InvalidProbability(_) => "invalid_probability",
            Self::InvalidFee(_) => "invalid_fee",
            Self::InvalidLiquidity(_) => "invalid_liquidity",
            Self::MarketNotFound(_) => "market_not_found",
            Self::PressureLimit { .. } => "pressure_limit",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

/// Convenience alias used throughout the domain and use-case layers.
pub type EngineResult<T> = Result<T, EngineError>;
