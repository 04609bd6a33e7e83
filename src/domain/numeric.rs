//! Shared numeric helpers: input normalization, validation, clamping and
//! cent rounding.
//!
//! Probabilities enter the engine either as fractions (0.4) or as
//! percentages (40.0). Everything past this module sees fractions only.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::{EngineError, EngineResult};

/// Platform fee charged on winning profit (1%).
pub const DEFAULT_PLATFORM_FEE: f64 = 0.01;

/// Default liquidity parameter `b` in dollars.
pub const DEFAULT_LIQUIDITY: f64 = 100.0;

/// Lower bound of any probability reported to callers.
pub const MIN_REPORTED_PROBABILITY: f64 = 0.01;

/// Upper bound of any probability reported to callers.
pub const MAX_REPORTED_PROBABILITY: f64 = 0.99;

/// Largest accepted liquidity parameter `b`.
///
/// Rounding error in the log-odds identity scales with `b`; above this
/// even moderate prices drift past the tolerance.
pub const MAX_LIQUIDITY: f64 = 1e9;

/// Tolerance of the `qY - qN = b * ln(p / (1 - p))` identity check.
pub const INVERSE_TOLERANCE: f64 = 1e-4;

/// Normalize a probability given as a fraction or a percentage.
///
/// Values above 1 are read as percentages and divided by 100. The result
/// must lie in [0, 1].
pub fn normalize_probability(probability: f64) -> EngineResult<f64> {
    if !probability.is_finite() {
        return Err(EngineError::InvalidProbability(probability));
    }
    let p = if probability > 1.0 {
        probability / 100.0
    } else {
        probability
    };
    if !(0.0..=1.0).contains(&p) {
        return Err(EngineError::InvalidProbability(probability));
    }
    Ok(p)
}

/// Clamp a probability into the reportable band [0.01, 0.99].
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(MIN_REPORTED_PROBABILITY, MAX_REPORTED_PROBABILITY)
}

/// Validate a stake: finite and strictly positive.
pub fn validate_stake(stake: f64) -> EngineResult<f64> {
    if stake.is_finite() && stake > 0.0 {
        Ok(stake)
    } else {
        Err(EngineError::InvalidStake(stake))
    }
}

/// Validate a fee fraction in [0, 1].
pub fn validate_fee(fee: f64) -> EngineResult<f64> {
    if fee.is_finite() && (0.0..=1.0).contains(&fee) {
        Ok(fee)
    } else {
        Err(EngineError::InvalidFee(fee))
    }
}

/// Validate a liquidity parameter: finite, strictly positive and at most
/// [`MAX_LIQUIDITY`].
pub fn validate_liquidity(b: f64) -> EngineResult<f64> {
    if b.is_finite() && b > 0.0 && b <= MAX_LIQUIDITY {
        Ok(b)
    } else {
        Err(EngineError::InvalidLiquidity(b))
    }
}

/// Logistic function `1 / (1 + e^-x)` evaluated without overflow.
///
/// Equal to `e^a / (e^a + e^c)` with `x = a - c`, which is the softmax
/// price of the YES side.
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Log-odds `ln(p / (1 - p))`.
pub fn log_odds(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Round a dollar amount to cents for display, halves away from zero.
pub fn to_cents(amount: f64) -> Decimal {
    Decimal::from_f64(amount)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
