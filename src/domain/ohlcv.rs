//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Daily bar stamped at midnight of `date`.
    pub fn daily(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            timestamp: date.and_time(chrono::NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// True when every price field is finite and strictly positive.
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
    }
}
