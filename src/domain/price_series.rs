//! Validated, read-only price series and borrowed sub-range views.
//!
//! A [`PriceSeries`] can only be built through [`PriceSeries::new`], so every
//! series in the crate has strictly increasing timestamps and finite,
//! positive prices. Window evaluation works on [`SeriesSlice`] views; derived
//! values are always produced as new vectors.

use std::ops::Range;

use chrono::NaiveDateTime;

use crate::domain::error::WfoptError;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, WfoptError> {
        if bars.is_empty() {
            return Err(WfoptError::data_integrity("price series is empty"));
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.has_valid_prices() {
                return Err(WfoptError::data_integrity(format!(
                    "bar {} at {} has a non-finite or non-positive price",
                    i, bar.timestamp
                )));
            }
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(WfoptError::data_integrity(format!(
                "timestamps not strictly increasing at bar {}: {} follows {}",
                i + 1,
                bars[i + 1].timestamp,
                bars[i].timestamp
            )));
        }

        let closes = bars.iter().map(|b| b.close).collect();
        Ok(Self { bars, closes })
    }

    /// Builds a daily series from closing prices alone, starting at `start`.
    pub fn from_closes(start: chrono::NaiveDate, closes: &[f64]) -> Result<Self, WfoptError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Bar::daily(
                    start + chrono::Duration::days(i as i64),
                    close,
                    close,
                    close,
                    close,
                    0.0,
                )
            })
            .collect();
        Self::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn first_timestamp(&self) -> NaiveDateTime {
        self.bars[0].timestamp
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }

    pub fn as_slice(&self) -> SeriesSlice<'_> {
        SeriesSlice {
            bars: &self.bars,
            closes: &self.closes,
        }
    }

    /// View over `range`. Panics if the range is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> SeriesSlice<'_> {
        SeriesSlice {
            bars: &self.bars[range.clone()],
            closes: &self.closes[range],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesSlice<'a> {
    bars: &'a [Bar],
    closes: &'a [f64],
}

impl<'a> SeriesSlice<'a> {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn closes(&self) -> &'a [f64] {
        self.closes
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + 'a {
        self.bars.iter().map(|b| b.timestamp)
    }
}
