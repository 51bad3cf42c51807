//! Technical indicator implementations.
//!
//! Indicators take a closing-price slice and return a new vector aligned with
//! it; warm-up points are `None` rather than NaN.

pub mod sma;

pub use sma::calculate_sma;
