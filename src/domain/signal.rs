//! SMA crossover signal generation.
//!
//! A bar is `Long` when both moving averages are defined and the fast one is
//! strictly above the slow one; every other bar is `Flat`.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::error::WfoptError;
use crate::domain::indicator::calculate_sma;
use crate::domain::price_series::SeriesSlice;

/// Fast/slow window pair. Ordered by `(fast_window, slow_window)`, which is
/// the canonical order used to break fitness ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalParameters {
    fast_window: usize,
    slow_window: usize,
}

impl SignalParameters {
    pub fn new(fast_window: usize, slow_window: usize) -> Result<Self, WfoptError> {
        if fast_window == 0 {
            return Err(WfoptError::configuration("fast_window must be positive"));
        }
        if fast_window >= slow_window {
            return Err(WfoptError::configuration(format!(
                "fast_window ({}) must be less than slow_window ({})",
                fast_window, slow_window
            )));
        }
        Ok(Self {
            fast_window,
            slow_window,
        })
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }
}

impl fmt::Display for SignalParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA({})/SMA({})", self.fast_window, self.slow_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// Fraction of capital exposed to the next bar's price change.
    pub fn exposure(self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub timestamp: NaiveDateTime,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSignal {
    pub points: Vec<SignalPoint>,
}

impl PositionSignal {
    /// All-flat signal aligned with `prices`.
    pub fn flat(prices: SeriesSlice<'_>) -> Self {
        Self {
            points: prices
                .timestamps()
                .map(|timestamp| SignalPoint {
                    timestamp,
                    position: Position::Flat,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn long_bars(&self) -> usize {
        self.positions().filter(|p| *p == Position::Long).count()
    }
}

pub fn generate(prices: SeriesSlice<'_>, params: SignalParameters) -> PositionSignal {
    if prices.len() < params.slow_window {
        return PositionSignal::flat(prices);
    }

    let fast = calculate_sma(prices.closes(), params.fast_window);
    let slow = calculate_sma(prices.closes(), params.slow_window);

    let points = prices
        .timestamps()
        .zip(fast.iter().zip(slow.iter()))
        .map(|(timestamp, (f, s))| {
            let position = match (f, s) {
                (Some(f), Some(s)) if f > s => Position::Long,
                _ => Position::Flat,
            };
            SignalPoint {
                timestamp,
                position,
            }
        })
        .collect();

    PositionSignal { points }
}
