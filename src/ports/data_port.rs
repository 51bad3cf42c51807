//! Market data port trait.

use crate::domain::error::WfoptError;
use crate::domain::period::LookbackPeriod;
use crate::domain::price_series::PriceSeries;

/// Source of OHLCV history.
///
/// Implementations report a missing symbol or an unreachable source as
/// [`WfoptError::DataUnavailable`] and malformed data as
/// [`WfoptError::DataIntegrity`]. Callers propagate both unchanged.
pub trait DataPort {
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, WfoptError>;

    fn list_symbols(&self) -> Result<Vec<String>, WfoptError>;
}
