#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
pub use wfopt::domain::error::WfoptError;
use wfopt::domain::ohlcv::Bar;
use wfopt::domain::period::LookbackPeriod;
pub use wfopt::domain::price_series::PriceSeries;
use wfopt::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<f64>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.data.insert(symbol.to_string(), closes);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch(&self, symbol: &str, _period: LookbackPeriod) -> Result<PriceSeries, WfoptError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(WfoptError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let closes = self
            .data
            .get(symbol)
            .ok_or_else(|| WfoptError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no data".into(),
            })?;
        PriceSeries::from_closes(start_date(), closes)
    }

    fn list_symbols(&self) -> Result<Vec<String>, WfoptError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes(start_date(), closes).unwrap()
}

/// `100, 101, 102, ...`
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

/// Alternating up and down legs of `leg` bars each, so crossovers occur.
pub fn zigzag_closes(n: usize, leg: usize) -> Vec<f64> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            if (i / leg) % 2 == 0 {
                price += 1.0;
            } else {
                price -= 0.8;
            }
            price
        })
        .collect()
}

pub fn make_bar(date: NaiveDate, close: f64) -> Bar {
    Bar::daily(date, close, close + 1.0, close - 1.0, close, 1000.0)
}

/// Writes `<dir>/<symbol>.csv` with one row per close on consecutive days.
pub fn write_symbol_csv(dir: &std::path::Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let d = start_date() + chrono::Duration::days(i as i64);
        content.push_str(&format!(
            "{},{},{},{},{},1000\n",
            d.format("%Y-%m-%d"),
            c,
            c + 1.0,
            c - 1.0,
            c
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}
