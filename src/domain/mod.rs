//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod period;
pub mod indicator;
pub mod signal;
pub mod evaluator;
pub mod walk_forward;
pub mod summary;
pub mod config_validation;
pub mod error;
