//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row
//! `date,open,high,low,close,volume`. Dates are `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM:SS`. Rows must be in strictly increasing date order;
//! out-of-order or duplicate dates are a data integrity error.

use crate::domain::error::WfoptError;
use crate::domain::ohlcv::Bar;
use crate::domain::period::LookbackPeriod;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<Bar>, WfoptError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| WfoptError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| WfoptError::data_integrity(format!("CSV parse error: {}", e)))?;
            // Header is line 1.
            let line = row + 2;

            let timestamp = parse_timestamp(field(&record, 0, "date", line)?)
                .ok_or_else(|| {
                    WfoptError::data_integrity(format!("line {}: invalid date format", line))
                })?;

            bars.push(Bar {
                timestamp,
                open: parse_number(&record, 1, "open", line)?,
                high: parse_number(&record, 2, "high", line)?,
                low: parse_number(&record, 3, "low", line)?,
                close: parse_number(&record, 4, "close", line)?,
                volume: parse_number(&record, 5, "volume", line)?,
            });
        }

        Ok(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, WfoptError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| WfoptError::data_integrity(format!("line {}: missing {} column", line, name)))
}

fn parse_number(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, WfoptError> {
    field(record, index, name, line)?.parse().map_err(|e| {
        WfoptError::data_integrity(format!("line {}: invalid {} value: {}", line, name, e))
    })
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

impl DataPort for CsvAdapter {
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, WfoptError> {
        let bars = self.read_bars(symbol)?;
        if bars.is_empty() {
            return Err(WfoptError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "file contains no bars".into(),
            });
        }

        // Validate the whole file so rows outside the period are checked too.
        let full = PriceSeries::new(bars)?;
        let start = period.start_date(full.last_timestamp().date());
        let bars: Vec<Bar> = full
            .bars()
            .iter()
            .filter(|b| b.date() > start)
            .cloned()
            .collect();
        PriceSeries::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, WfoptError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| WfoptError::DataUnavailable {
            symbol: "*".into(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(WfoptError::Io)?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_returns_bars_in_file_order() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch("BHP", LookbackPeriod::OneYear).unwrap();
        assert_eq!(series.len(), 3);
        let first = &series.bars()[0];
        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, 50000.0);
        assert_eq!(series.closes(), &[105.0, 110.0, 115.0]);
    }

    #[test]
    fn out_of_order_rows_are_integrity_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("SHUF.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch("SHUF", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataIntegrity { .. }));
    }

    #[test]
    fn mistyped_year_is_not_trimmed_away() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("TYPO.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,1,1,1,1,1\n\
             2014-01-16,2,2,2,2,1\n\
             2024-01-17,3,3,3,3,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch("TYPO", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataIntegrity { .. }));
    }

    #[test]
    fn fetch_trims_to_period() {
        let dir = TempDir::new().unwrap();
        let mut csv_content = String::from("date,open,high,low,close,volume\n");
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        for i in 0..730 {
            let d = start + chrono::Duration::days(i);
            csv_content.push_str(&format!("{},1,1,1,1,10\n", d.format("%Y-%m-%d")));
        }
        fs::write(dir.path().join("LONG.csv"), csv_content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter.fetch("LONG", LookbackPeriod::ThreeMonths).unwrap();
        let last = series.last_timestamp().date();
        assert!(series.first_timestamp().date() > LookbackPeriod::ThreeMonths.start_date(last));
        assert!(series.len() > 85 && series.len() < 95);
    }

    #[test]
    fn fetch_accepts_datetime_column() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("INTRA.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15 09:30:00,1,1,1,1,1\n\
             2024-01-15 09:31:00,2,2,2,2,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let series = adapter.fetch("INTRA", LookbackPeriod::OneMonth).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch("XYZ", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataUnavailable { symbol, .. } if symbol == "XYZ"));
    }

    #[test]
    fn empty_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch("CBA", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataUnavailable { .. }));
    }

    #[test]
    fn malformed_price_is_integrity_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,abc,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch("BAD", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataIntegrity { reason } if reason.contains("close")));
    }

    #[test]
    fn duplicate_dates_are_integrity_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DUP.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,1\n2024-01-15,2,2,2,2,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch("DUP", LookbackPeriod::OneYear).unwrap_err();
        assert!(matches!(err, WfoptError::DataIntegrity { .. }));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }
}
