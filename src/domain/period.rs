//! Lookback periods accepted by data providers.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};

use crate::domain::error::WfoptError;

/// Approximate trading days per calendar month.
pub const TRADING_DAYS_PER_MONTH: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookbackPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FiveYears,
}

impl LookbackPeriod {
    pub const ALL: [LookbackPeriod; 7] = [
        LookbackPeriod::OneMonth,
        LookbackPeriod::ThreeMonths,
        LookbackPeriod::SixMonths,
        LookbackPeriod::OneYear,
        LookbackPeriod::TwoYears,
        LookbackPeriod::ThreeYears,
        LookbackPeriod::FiveYears,
    ];

    pub fn months(self) -> u32 {
        match self {
            LookbackPeriod::OneMonth => 1,
            LookbackPeriod::ThreeMonths => 3,
            LookbackPeriod::SixMonths => 6,
            LookbackPeriod::OneYear => 12,
            LookbackPeriod::TwoYears => 24,
            LookbackPeriod::ThreeYears => 36,
            LookbackPeriod::FiveYears => 60,
        }
    }

    pub fn approx_trading_days(self) -> usize {
        self.months() as usize * TRADING_DAYS_PER_MONTH
    }

    /// First calendar date covered when the period ends on `end`.
    pub fn start_date(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Converts a length in months to an approximate bar count for daily data.
/// `None` when the count does not fit in `usize`.
pub fn months_to_bars(months: usize) -> Option<usize> {
    months.checked_mul(TRADING_DAYS_PER_MONTH)
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::ThreeYears => "3y",
            LookbackPeriod::FiveYears => "5y",
        };
        f.write_str(s)
    }
}

impl FromStr for LookbackPeriod {
    type Err = WfoptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        LookbackPeriod::ALL
            .into_iter()
            .find(|p| p.to_string() == normalized)
            .ok_or_else(|| {
                WfoptError::configuration(format!(
                    "unknown period '{}', expected one of 1mo, 3mo, 6mo, 1y, 2y, 3y, 5y",
                    s.trim()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for p in LookbackPeriod::ALL {
            assert_eq!(p.to_string().parse::<LookbackPeriod>().unwrap(), p);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("2Y".parse::<LookbackPeriod>().unwrap(), LookbackPeriod::TwoYears);
        assert_eq!(" 6mo ".parse::<LookbackPeriod>().unwrap(), LookbackPeriod::SixMonths);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "10y".parse::<LookbackPeriod>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn trading_days() {
        assert_eq!(LookbackPeriod::OneYear.approx_trading_days(), 252);
        assert_eq!(months_to_bars(6), Some(126));
    }

    #[test]
    fn months_to_bars_overflow() {
        assert_eq!(months_to_bars(usize::MAX / TRADING_DAYS_PER_MONTH + 1), None);
        assert!(months_to_bars(usize::MAX / TRADING_DAYS_PER_MONTH).is_some());
    }

    #[test]
    fn start_date_subtracts_months() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            LookbackPeriod::OneMonth.start_date(end),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            LookbackPeriod::TwoYears.start_date(end),
            NaiveDate::from_ymd_opt(2022, 3, 31).unwrap()
        );
    }
}
