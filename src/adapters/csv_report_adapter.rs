//! CSV walk-forward report adapter.
//!
//! One row per window, in window order:
//! `window,train_start,train_end,test_start,test_end,fast_window,slow_window,
//! in_sample_return_pct,out_of_sample_return_pct,buy_and_hold_return_pct`.
//! Window bounds are written as the dates of the first and last bar of each
//! slice.

use std::fs::File;

use crate::domain::error::WfoptError;
use crate::ports::report_port::{ReportInput, ReportPort};

pub const HEADER: [&str; 10] = [
    "window",
    "train_start",
    "train_end",
    "test_start",
    "test_end",
    "fast_window",
    "slow_window",
    "in_sample_return_pct",
    "out_of_sample_return_pct",
    "buy_and_hold_return_pct",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn write_to<W: std::io::Write>(
        &self,
        input: &ReportInput<'_>,
        writer: W,
    ) -> Result<(), WfoptError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER).map_err(csv_error)?;

        for (i, r) in input.results.iter().enumerate() {
            let w = &r.window;
            wtr.write_record([
                i.to_string(),
                stamp(input, w.train_start)?,
                stamp(input, w.train_end - 1)?,
                stamp(input, w.test_start)?,
                stamp(input, w.test_end - 1)?,
                r.parameters.fast_window().to_string(),
                r.parameters.slow_window().to_string(),
                format!("{:.4}", r.in_sample_fitness * 100.0),
                format!("{:.4}", r.out_of_sample_return_pct),
                format!("{:.4}", r.buy_and_hold_return_pct),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn stamp(input: &ReportInput<'_>, index: usize) -> Result<String, WfoptError> {
    input
        .timestamps
        .get(index)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            WfoptError::data_integrity(format!(
                "window index {} outside series of {} bars",
                index,
                input.timestamps.len()
            ))
        })
}

fn csv_error(e: csv::Error) -> WfoptError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => WfoptError::Io(io),
        other => WfoptError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, input: &ReportInput<'_>, output_path: &str) -> Result<(), WfoptError> {
        let file = File::create(output_path)?;
        self.write_to(input, file)
    }
}
