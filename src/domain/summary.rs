//! Aggregate statistics over walk-forward window results.

use std::collections::BTreeMap;

use super::evaluator::compound;
use super::signal::SignalParameters;
use super::walk_forward::EvaluationResult;

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardSummary {
    pub windows: usize,
    pub average_return_pct: f64,
    /// Share of windows with a positive out-of-sample return, 0..=1.
    pub win_rate: f64,
    pub best_window: Option<usize>,
    pub worst_window: Option<usize>,
    /// Out-of-sample returns chained window after window.
    pub compounded_return_pct: f64,
    pub average_buy_and_hold_pct: f64,
    pub average_in_sample_pct: f64,
    /// Average out-of-sample return over average in-sample return.
    pub efficiency: f64,
    pub most_selected: Option<(SignalParameters, usize)>,
}

impl WalkForwardSummary {
    pub fn compute(results: &[EvaluationResult]) -> Self {
        let windows = results.len();
        if windows == 0 {
            return Self {
                windows: 0,
                average_return_pct: 0.0,
                win_rate: 0.0,
                best_window: None,
                worst_window: None,
                compounded_return_pct: 0.0,
                average_buy_and_hold_pct: 0.0,
                average_in_sample_pct: 0.0,
                efficiency: 0.0,
                most_selected: None,
            };
        }

        let n = windows as f64;
        let average_return_pct =
            results.iter().map(|r| r.out_of_sample_return_pct).sum::<f64>() / n;
        let average_buy_and_hold_pct =
            results.iter().map(|r| r.buy_and_hold_return_pct).sum::<f64>() / n;
        let average_in_sample_pct =
            results.iter().map(|r| r.in_sample_fitness * 100.0).sum::<f64>() / n;

        let wins = results
            .iter()
            .filter(|r| r.out_of_sample_return_pct > 0.0)
            .count();
        let win_rate = wins as f64 / n;

        let mut best = 0usize;
        let mut worst = 0usize;
        for (i, r) in results.iter().enumerate() {
            if r.out_of_sample_return_pct > results[best].out_of_sample_return_pct {
                best = i;
            }
            if r.out_of_sample_return_pct < results[worst].out_of_sample_return_pct {
                worst = i;
            }
        }

        let oos: Vec<f64> = results.iter().map(|r| r.out_of_sample_fitness).collect();
        let compounded_return_pct = compound(&oos) * 100.0;

        let efficiency = if average_in_sample_pct != 0.0 {
            average_return_pct / average_in_sample_pct
        } else {
            0.0
        };

        Self {
            windows,
            average_return_pct,
            win_rate,
            best_window: Some(best),
            worst_window: Some(worst),
            compounded_return_pct,
            average_buy_and_hold_pct,
            average_in_sample_pct,
            efficiency,
            most_selected: most_selected(results),
        }
    }
}

fn most_selected(results: &[EvaluationResult]) -> Option<(SignalParameters, usize)> {
    let mut counts: BTreeMap<SignalParameters, usize> = BTreeMap::new();
    for r in results {
        *counts.entry(r.parameters).or_insert(0) += 1;
    }

    // BTreeMap iterates in canonical order; keep the first maximum.
    let mut best: Option<(SignalParameters, usize)> = None;
    for (params, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((params, count)),
        }
    }
    best
}
