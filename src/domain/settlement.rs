//! Rebated-risk settlement calculator.
//!
//! A trade of stake `S` placed at probability `p` with platform fee `f`
//! settles as:
//!
//! - Win:  profit `S(1 - p)(1 - f)`, paid back with the stake.
//! - Lose: only `S(1 - p)` is lost; the rebate `Sp` is refunded.
//! - The platform keeps `Sf(1 - p)`, and only from winning trades.
//!
//! Winner profit plus platform revenue equals the amount a loser would have
//! had at risk, so the model never pays out more than was put at risk.
//!
//! Probabilities may be passed as fractions or percentages; fees are always
//! fractions. All functions are pure.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::{EngineError, EngineResult};
use super::numeric::{
    normalize_probability, to_cents, validate_fee, validate_stake, DEFAULT_PLATFORM_FEE,
};

/// Validated `(S, p, f)` triple.
fn inputs(stake: f64, probability: f64, fee: f64) -> EngineResult<(f64, f64, f64)> {
    Ok((
        validate_stake(stake)?,
        normalize_probability(probability)?,
        validate_fee(fee)?,
    ))
}

/// Profit paid to a winning trade after the platform fee: `S(1 - p)(1 - f)`.
pub fn win_profit(stake: f64, probability: f64, fee: f64) -> EngineResult<f64> {
    let (s, p, f) = inputs(stake, probability, fee)?;
    Ok(s * (1.0 - p) * (1.0 - f))
}

/// Total paid to a winning trade: stake plus profit.
pub fn win_return(stake: f64, probability: f64, fee: f64) -> EngineResult<f64> {
    Ok(stake + win_profit(stake, probability, fee)?)
}

/// Amount at risk on a losing trade: `S(1 - p)`.
pub fn loss_amount(stake: f64, probability: f64) -> EngineResult<f64> {
    let (s, p, _) = inputs(stake, probability, 0.0)?;
    Ok(s * (1.0 - p))
}

/// Rebate refunded to a losing trade: `Sp`.
pub fn lose_refund(stake: f64, probability: f64) -> EngineResult<f64> {
    let (s, p, _) = inputs(stake, probability, 0.0)?;
    Ok(s * p)
}

/// Fee revenue collected from a winning trade: `Sf(1 - p)`.
pub fn platform_revenue(stake: f64, probability: f64, fee: f64) -> EngineResult<f64> {
    let (s, p, f) = inputs(stake, probability, fee)?;
    Ok(s * f * (1.0 - p))
}

/// Risk/reward ratio as `"1:x.xx"` (loss over profit), or `"-"` when a win
/// pays nothing.
pub fn risk_reward(stake: f64, probability: f64, fee: f64) -> EngineResult<String> {
    let profit = win_profit(stake, probability, fee)?;
    let loss = loss_amount(stake, probability)?;
    if profit <= 0.0 {
        return Ok("-".to_string());
    }
    Ok(format!("1:{:.2}", loss / profit))
}

/// Odds implied by a probability in several conventions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpliedOdds {
    /// Decimal odds, `1 / p`.
    pub decimal: f64,
    /// Fractional odds as `"against/for"` in whole percent.
    pub fractional: String,
    /// American moneyline odds.
    pub american: i64,
    /// Probability as a percentage.
    pub percentage: f64,
}

/// Implied odds for a probability strictly between 0 and 1.
#[allow(clippy::cast_possible_truncation)]
pub fn implied_odds(probability: f64) -> EngineResult<ImpliedOdds> {
    let p = normalize_probability(probability)?;
    if p <= 0.0 || p >= 1.0 {
        return Err(EngineError::InvalidProbability(probability));
    }
    let american = if p >= 0.5 {
        (-100.0 * p / (1.0 - p)).round()
    } else {
        (100.0 * (1.0 - p) / p).round()
    };
    Ok(ImpliedOdds {
        decimal: 1.0 / p,
        fractional: format!("{}/{}", ((1.0 - p) * 100.0).round(), (p * 100.0).round()),
        american: american as i64,
        percentage: p * 100.0,
    })
}

/// Whether a settled trade won or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }
}

/// Outcome-specific payout amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "UPPERCASE")]
pub enum Payout {
    Win {
        profit: f64,
        total_return: f64,
        platform_revenue: f64,
    },
    Lose {
        loss_at_risk: f64,
        refund: f64,
        total_return: f64,
    },
}

/// A settled trade: the payout plus the inputs it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settlement {
    pub stake: f64,
    /// Normalized probability at trade time, in [0, 1].
    pub probability: f64,
    pub fee: f64,
    #[serde(flatten)]
    pub payout: Payout,
}

impl Settlement {
    pub const fn outcome(&self) -> Outcome {
        match self.payout {
            Payout::Win { .. } => Outcome::Win,
            Payout::Lose { .. } => Outcome::Lose,
        }
    }

    /// Total amount handed back to the trader.
    pub const fn total_return(&self) -> f64 {
        match self.payout {
            Payout::Win { total_return, .. } | Payout::Lose { total_return, .. } => total_return,
        }
    }

    /// Net change to the trader's balance: profit on a win, minus the
    /// amount at risk on a loss.
    pub fn user_net(&self) -> f64 {
        match self.payout {
            Payout::Win { profit, .. } => profit,
            Payout::Lose { loss_at_risk, .. } => -loss_at_risk,
        }
    }

    /// Platform revenue earned; zero on a loss.
    pub const fn platform_revenue(&self) -> f64 {
        match self.payout {
            Payout::Win {
                platform_revenue, ..
            } => platform_revenue,
            Payout::Lose { .. } => 0.0,
        }
    }
}

/// Settle one trade under the rebated-risk model.
///
/// This is the single entry point for resolution: the win and loss
/// formulas are coupled and must not be recomputed elsewhere.
pub fn settle_trade(stake: f64, probability: f64, won: bool, fee: f64) -> EngineResult<Settlement> {
    let (s, p, f) = inputs(stake, probability, fee)?;
    let at_risk = s * (1.0 - p);

    let payout = if won {
        let profit = at_risk * (1.0 - f);
        Payout::Win {
            profit,
            total_return: s + profit,
            platform_revenue: s * f * (1.0 - p),
        }
    } else {
        let refund = s * p;
        Payout::Lose {
            loss_at_risk: at_risk,
            refund,
            total_return: refund,
        }
    };

    Ok(Settlement {
        stake: s,
        probability: p,
        fee: f,
        payout,
    })
}

/// Win-side figures of a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinScenario {
    pub profit: f64,
    pub total_return: f64,
    /// Total return as a percentage of the stake.
    pub return_percent: f64,
}

/// Lose-side figures of a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoseScenario {
    pub loss: f64,
    pub refund: f64,
    /// Refund as a percentage of the stake.
    pub return_percent: f64,
}

/// Both possible settlements of a prospective trade, for display before
/// the trade is committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeBreakdown {
    pub stake: f64,
    pub probability: f64,
    pub probability_percent: f64,
    pub fee: f64,
    pub fee_percent: f64,
    pub win: WinScenario,
    pub lose: LoseScenario,
    pub platform_revenue: f64,
    pub risk_reward: String,
    /// `None` when the probability sits exactly on 0 or 1.
    pub implied_odds: Option<ImpliedOdds>,
}

/// Monetary amounts of a breakdown rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CentsBreakdown {
    pub win_profit: Decimal,
    pub win_return: Decimal,
    pub loss: Decimal,
    pub refund: Decimal,
    pub platform_revenue: Decimal,
}

impl TradeBreakdown {
    pub fn in_cents(&self) -> CentsBreakdown {
        CentsBreakdown {
            win_profit: to_cents(self.win.profit),
            win_return: to_cents(self.win.total_return),
            loss: to_cents(self.lose.loss),
            refund: to_cents(self.lose.refund),
            platform_revenue: to_cents(self.platform_revenue),
        }
    }
}

/// Full win/lose breakdown of a prospective trade.
pub fn trade_breakdown(stake: f64, probability: f64, fee: f64) -> EngineResult<TradeBreakdown> {
    let (s, p, f) = inputs(stake, probability, fee)?;
    let win = settle_trade(s, p, true, f)?;
    let lose = settle_trade(s, p, false, f)?;

    Ok(TradeBreakdown {
        stake: s,
        probability: p,
        probability_percent: p * 100.0,
        fee: f,
        fee_percent: f * 100.0,
        win: WinScenario {
            profit: win.user_net(),
            total_return: win.total_return(),
            return_percent: win.total_return() / s * 100.0,
        },
        lose: LoseScenario {
            loss: -lose.user_net(),
            refund: lose.total_return(),
            return_percent: lose.total_return() / s * 100.0,
        },
        platform_revenue: win.platform_revenue(),
        risk_reward: risk_reward(s, p, f)?,
        implied_odds: implied_odds(p).ok(),
    })
}

/// Settlement calculator bound to a configured platform fee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementCalculator {
    fee: f64,
}

impl SettlementCalculator {
    pub fn new(fee: f64) -> EngineResult<Self> {
        Ok(Self {
            fee: validate_fee(fee)?,
        })
    }

    pub const fn fee(&self) -> f64 {
        self.fee
    }

    pub fn settle(&self, stake: f64, probability: f64, won: bool) -> EngineResult<Settlement> {
        settle_trade(stake, probability, won, self.fee)
    }

    pub fn breakdown(&self, stake: f64, probability: f64) -> EngineResult<TradeBreakdown> {
        trade_breakdown(stake, probability, self.fee)
    }
}

impl Default for SettlementCalculator {
    /// Calculator with the standard 1% platform fee.
    fn default() -> Self {
        Self {
            fee: DEFAULT_PLATFORM_FEE,
        }
    }
}
