//! Vectorised backtest evaluation of a position signal.
//!
//! The position held at bar `i-1` earns the `i-1 -> i` price change, so the
//! return attributed to bar `i` never looks at data after bar `i`.

use crate::domain::error::WfoptError;
use crate::domain::price_series::SeriesSlice;
use crate::domain::signal::{Position, PositionSignal};

/// Per-change trading costs, as fractions of exposure (0.001 = 0.1%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostModel {
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl CostModel {
    /// Cost-free evaluation, the walk-forward search default.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(commission_pct: f64, slippage_pct: f64) -> Result<Self, WfoptError> {
        for (name, value) in [("commission_pct", commission_pct), ("slippage_pct", slippage_pct)] {
            if !value.is_finite() || value < 0.0 {
                return Err(WfoptError::configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            commission_pct,
            slippage_pct,
        })
    }

    pub fn per_change(&self) -> f64 {
        self.commission_pct + self.slippage_pct
    }

    pub fn is_free(&self) -> bool {
        self.per_change() == 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Per-bar strategy returns as fractions; `returns[0]` is always 0.
    pub returns: Vec<f64>,
    /// Compounded cumulative return as a fraction.
    pub fitness: f64,
}

impl Evaluation {
    pub fn return_pct(&self) -> f64 {
        self.fitness * 100.0
    }
}

pub fn evaluate(
    prices: SeriesSlice<'_>,
    signal: &PositionSignal,
    costs: CostModel,
) -> Result<Evaluation, WfoptError> {
    if signal.len() != prices.len() {
        return Err(WfoptError::data_integrity(format!(
            "signal has {} points but price slice has {} bars",
            signal.len(),
            prices.len()
        )));
    }

    let closes = prices.closes();
    let positions: Vec<Position> = signal.positions().collect();
    let per_change = costs.per_change();

    let mut returns = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            returns.push(0.0);
            continue;
        }

        let held = positions[i - 1];
        let mut r = held.exposure() * percent_change(closes[i - 1], closes[i]);

        if per_change > 0.0 {
            // The change decided at bar i-1 takes effect over i-1 -> i.
            let before = if i >= 2 { positions[i - 2] } else { Position::Flat };
            r -= per_change * (held.exposure() - before.exposure()).abs();
        }

        returns.push(r);
    }

    let fitness = compound(&returns);
    Ok(Evaluation { returns, fitness })
}

/// Return of holding the whole slice, `close[last] / close[0] - 1`.
pub fn buy_and_hold_return(prices: SeriesSlice<'_>) -> f64 {
    let closes = prices.closes();
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) => percent_change(first, last),
        _ => 0.0,
    }
}

/// `prod(1 + r) - 1` over `returns`.
pub fn compound(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

fn percent_change(prev: f64, curr: f64) -> f64 {
    if prev > 0.0 { curr / prev - 1.0 } else { 0.0 }
}
