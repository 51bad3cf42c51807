//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) points are `None`.
//!
//! Each point sums its own window instead of carrying a running total, so a
//! value never depends on rounding accumulated from earlier bars.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    (0..closes.len())
        .map(|i| {
            if i + 1 >= period {
                let window = &closes[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            } else {
                None
            }
        })
        .collect()
}
