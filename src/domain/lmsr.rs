//! Logarithmic Market Scoring Rule (LMSR) pricing state for one binary market.
//!
//! The market holds two pressures, `qY` and `qN`, measured in dollars of
//! downside risk, and a liquidity parameter `b`. The YES probability is
//! always derived from them:
//!
//!   p = e^(qY/b) / (e^(qY/b) + e^(qN/b))
//!
//! which is equivalent to `qY - qN = b * ln(p / (1 - p))`.
//!
//! Trades are risk-weighted: a stake `S` adds `S(1 - p)` of pressure to the
//! traded side, so backing an outsider moves the price more per dollar
//! than backing a favourite.

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::numeric::{
    clamp_probability, log_odds, logistic, normalize_probability, validate_liquidity,
    validate_stake, DEFAULT_LIQUIDITY, INVERSE_TOLERANCE,
};
use super::trade::Side;

/// Ceiling on post-trade `|qY - qN| / b` for any liquidity.
///
/// At 16 the derived probability is within ~1.1e-7 of the boundary; much
/// further out `1 - p` loses the precision the log-odds identity needs.
pub const MAX_LOG_ODDS: f64 = 16.0;

/// Largest post-trade `|qY - qN| / b` a market with liquidity `b` accepts.
///
/// Evaluating `b * ln(p / (1 - p))` at log-odds `x` carries an error of
/// about `b * EPSILON * (1 + e^|x|)`. The limit keeps that below half of
/// [`INVERSE_TOLERANCE`], capped at [`MAX_LOG_ODDS`].
pub fn max_log_odds(liquidity: f64) -> f64 {
    let headroom = INVERSE_TOLERANCE / (2.0 * liquidity * f64::EPSILON);
    (headroom - 1.0).max(1.0).ln().min(MAX_LOG_ODDS)
}

/// Exported pricing state: the exact pressures plus the liquidity needed
/// to rebuild the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// YES pressure `qY`.
    pub yes_pressure: f64,
    /// NO pressure `qN`.
    pub no_pressure: f64,
    /// Liquidity parameter `b`.
    pub liquidity: f64,
}

/// Result of checking `qY - qN = b * ln(p / (1 - p))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InverseCheck {
    /// Left-hand side, `qY - qN`.
    pub pressure_gap: f64,
    /// Right-hand side, `b * ln(p / (1 - p))`.
    pub scaled_log_odds: f64,
    /// Absolute difference between the two sides.
    pub difference: f64,
    /// Whether the difference is within tolerance.
    pub is_valid: bool,
}

/// Read-only view of a market for display and persistence dumps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketSummary {
    #[serde(flatten)]
    pub state: MarketState,
    pub probability: f64,
    pub probability_percent: f64,
    pub inverse_check: InverseCheck,
}

/// Outcome of applying a trade to a market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeOutcome {
    /// YES probability before the trade.
    pub old_probability: f64,
    /// YES probability after the trade, clamped to [0.01, 0.99].
    pub new_probability: f64,
    /// Pressure added to the traded side, `S(1 - p)`.
    pub delta_q: f64,
    /// Unclamped probability change.
    pub delta_p: f64,
    pub side: Side,
    pub stake: f64,
}

/// Pricing state machine for a single binary market.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    yes_pressure: f64,
    no_pressure: f64,
    liquidity: f64,
}

impl Market {
    /// Create a market whose derived probability matches `initial_probability`.
    ///
    /// The probability may be a fraction or a percentage. An even market
    /// starts with both pressures at zero; any other start is clamped to
    /// [0.01, 0.99] and encoded entirely in `qY` with `qN = 0`.
    pub fn new(liquidity: f64, initial_probability: f64) -> EngineResult<Self> {
        let liquidity = validate_liquidity(liquidity)?;
        let p = normalize_probability(initial_probability)?;

        let mut market = Self {
            yes_pressure: 0.0,
            no_pressure: 0.0,
            liquidity,
        };
        if (p - 0.5).abs() > f64::EPSILON {
            market.yes_pressure = liquidity * log_odds(clamp_probability(p));
        }
        Ok(market)
    }

    /// Create an even (p = 0.5) market.
    pub fn with_liquidity(liquidity: f64) -> EngineResult<Self> {
        Self::new(liquidity, 0.5)
    }

    /// Rebuild a market from exported state without touching the pressures.
    pub fn from_state(state: MarketState) -> EngineResult<Self> {
        let mut market = Self::with_liquidity(state.liquidity)?;
        market.set_state(state)?;
        Ok(market)
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn yes_pressure(&self) -> f64 {
        self.yes_pressure
    }

    pub fn no_pressure(&self) -> f64 {
        self.no_pressure
    }

    /// Current YES probability, strictly inside (0, 1) for moderate pressures.
    ///
    /// Evaluated as the logistic of `(qY - qN) / b`, which is the softmax
    /// `e^(qY/b) / (e^(qY/b) + e^(qN/b))` without the overflow of the
    /// individual exponentials.
    pub fn probability(&self) -> f64 {
        logistic((self.yes_pressure - self.no_pressure) / self.liquidity)
    }

    /// Current YES probability as a percentage (0-100).
    pub fn probability_percent(&self) -> f64 {
        self.probability() * 100.0
    }

    /// Pressure a stake would add at the current price, `S(1 - p)`.
    pub fn delta_q(&self, stake: f64) -> EngineResult<f64> {
        let stake = validate_stake(stake)?;
        Ok(stake * (1.0 - self.probability()))
    }

    /// First-order preview of the probability move a trade would cause.
    ///
    /// `dp ~= (p(1 - p) / b) * S(1 - p)`, negated for NO. This is a local
    /// linearisation and drifts from [`Market::apply_trade`] once the stake
    /// is large relative to `b`.
    pub fn estimate_probability_change(&self, side: Side, stake: f64) -> EngineResult<f64> {
        let stake = validate_stake(stake)?;
        let p = self.probability();
        let delta_p = (p * (1.0 - p) / self.liquidity) * stake * (1.0 - p);
        Ok(side.sign() * delta_p)
    }

    /// Apply a risk-weighted trade and shift the price toward `side`.
    ///
    /// Inputs are validated before any write: a rejected trade leaves the
    /// market untouched. Only the reported `new_probability` is clamped;
    /// the pressures keep their exact values.
    pub fn apply_trade(&mut self, side: Side, stake: f64) -> EngineResult<TradeOutcome> {
        let stake = validate_stake(stake)?;
        let old_probability = self.probability();
        let delta_q = stake * (1.0 - old_probability);

        let (yes, no) = match side {
            Side::Yes => (self.yes_pressure + delta_q, self.no_pressure),
            Side::No => (self.yes_pressure, self.no_pressure + delta_q),
        };
        self.check_log_odds(yes, no)?;

        self.yes_pressure = yes;
        self.no_pressure = no;

        let raw_probability = self.probability();
        Ok(TradeOutcome {
            old_probability,
            new_probability: clamp_probability(raw_probability),
            delta_q,
            delta_p: raw_probability - old_probability,
            side,
            stake,
        })
    }

    /// Reinitialise the pressures so the market prices at `probability`.
    ///
    /// The target is clamped to [0.01, 0.99]; afterwards `qN = 0`.
    pub fn reset_to_probability(&mut self, probability: f64) -> EngineResult<()> {
        let p = clamp_probability(normalize_probability(probability)?);
        self.yes_pressure = self.liquidity * log_odds(p);
        self.no_pressure = 0.0;
        Ok(())
    }

    /// Export the exact pricing state.
    pub fn state(&self) -> MarketState {
        MarketState {
            yes_pressure: self.yes_pressure,
            no_pressure: self.no_pressure,
            liquidity: self.liquidity,
        }
    }

    /// Restore exact pressures and liquidity from an exported state.
    ///
    /// Pressures are taken verbatim, never re-derived from a probability.
    pub fn set_state(&mut self, state: MarketState) -> EngineResult<()> {
        let liquidity = validate_liquidity(state.liquidity)?;
        if !state.yes_pressure.is_finite() || !state.no_pressure.is_finite() {
            return Err(EngineError::InvalidState(format!(
                "non-finite pressures (qY={}, qN={})",
                state.yes_pressure, state.no_pressure
            )));
        }
        self.yes_pressure = state.yes_pressure;
        self.no_pressure = state.no_pressure;
        self.liquidity = liquidity;
        Ok(())
    }

    /// Check the `qY - qN = b * ln(p / (1 - p))` identity against the
    /// derived probability.
    pub fn verify_inverse_relationship(&self) -> InverseCheck {
        let p = self.probability();
        let pressure_gap = self.yes_pressure - self.no_pressure;
        let scaled_log_odds = self.liquidity * log_odds(p);
        let difference = (pressure_gap - scaled_log_odds).abs();
        InverseCheck {
            pressure_gap,
            scaled_log_odds,
            difference,
            is_valid: difference < INVERSE_TOLERANCE,
        }
    }

    /// State plus derived values for display.
    pub fn summary(&self) -> MarketSummary {
        let probability = self.probability();
        MarketSummary {
            state: self.state(),
            probability,
            probability_percent: probability * 100.0,
            inverse_check: self.verify_inverse_relationship(),
        }
    }

    fn check_log_odds(&self, yes: f64, no: f64) -> EngineResult<()> {
        let limit = max_log_odds(self.liquidity);
        let current = ((self.yes_pressure - self.no_pressure) / self.liquidity).abs();
        let next = (yes - no) / self.liquidity;
        if next.abs() > limit && next.abs() > current {
            return Err(EngineError::PressureLimit {
                log_odds: next,
                limit,
            });
        }
        Ok(())
    }
}

impl Default for Market {
    /// Even market with `b = 100`.
    fn default() -> Self {
        Self {
            yes_pressure: 0.0,
            no_pressure: 0.0,
            liquidity: DEFAULT_LIQUIDITY,
        }
    }
}
