//! Deterministic synthetic data adapter.
//!
//! Generates weekday bars ending on a fixed date, one bar per trading day of
//! the requested period. Prices follow alternating trend regimes with a
//! smooth oscillation on top; the phase and drift come from a hash of the
//! symbol so different symbols differ but the same symbol always returns the
//! same series.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::error::WfoptError;
use crate::domain::ohlcv::Bar;
use crate::domain::period::LookbackPeriod;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;

pub struct SyntheticAdapter {
    symbols: Vec<String>,
    end_date: NaiveDate,
    start_price: f64,
}

impl SyntheticAdapter {
    pub fn new(symbols: Vec<String>, end_date: NaiveDate) -> Self {
        Self {
            symbols: symbols.into_iter().map(|s| s.trim().to_uppercase()).collect(),
            end_date,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    fn trading_days_ending(&self, count: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(count);
        let mut d = self.end_date;
        while dates.len() < count {
            if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(d);
            }
            match d.pred_opt() {
                Some(prev) => d = prev,
                None => break,
            }
        }
        dates.reverse();
        dates
    }
}

fn symbol_seed(symbol: &str) -> u64 {
    // FNV-1a
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

impl DataPort for SyntheticAdapter {
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, WfoptError> {
        let key = symbol.trim().to_uppercase();
        if !self.symbols.contains(&key) {
            return Err(WfoptError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "symbol not known to synthetic provider".into(),
            });
        }

        let seed = symbol_seed(&key);
        let phase = (seed % 360) as f64 / 57.3;
        let drift = 0.0004 + (seed % 7) as f64 * 0.0001;
        let regime_len = 40 + (seed % 30) as usize;

        let dates = self.trading_days_ending(period.approx_trading_days());
        let mut price = self.start_price;
        let mut bars = Vec::with_capacity(dates.len());

        for (i, date) in dates.into_iter().enumerate() {
            let t = i as f64;
            let direction = if (i / regime_len) % 2 == 0 { 1.0 } else { -0.6 };
            let wave = (t * 0.21 + phase).sin() * 0.004 + (t * 0.047).cos() * 0.002;
            let open = price;
            price = (price * (1.0 + direction * drift + wave)).max(1.0);
            let spread = price * (0.004 + wave.abs());

            bars.push(Bar::daily(
                date,
                open,
                open.max(price) + spread,
                (open.min(price) - spread).max(0.5),
                price,
                1_000_000.0 + ((seed.rotate_left(i as u32 % 64) % 500_000) as f64),
            ));
        }

        PriceSeries::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, WfoptError> {
        let mut symbols = self.symbols.clone();
        symbols.sort();
        Ok(symbols)
    }
}
