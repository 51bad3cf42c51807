//! Walk-forward parameter search.
//!
//! The series is cut into successive `(train, test)` window pairs that
//! advance by one test length. On each train slice every grid candidate is
//! evaluated and the best in-sample fitness wins; the winner is then
//! re-evaluated, cold, on the adjoining test slice.

use std::collections::BTreeSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::error::WfoptError;
use crate::domain::evaluator::{CostModel, buy_and_hold_return, evaluate};
use crate::domain::price_series::{PriceSeries, SeriesSlice};
use crate::domain::signal::{SignalParameters, generate};

/// Half-open index ranges into the full series. `train_end == test_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub train_start: usize,
    pub train_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

impl WindowSpec {
    pub fn train_range(&self) -> Range<usize> {
        self.train_start..self.train_end
    }

    pub fn test_range(&self) -> Range<usize> {
        self.test_start..self.test_end
    }
}

/// Tiles `[0, len)` with `(train_len, test_len)` pairs stepping by `test_len`.
///
/// Returns an empty vector when not even one full pair fits.
pub fn generate_windows(
    len: usize,
    train_len: usize,
    test_len: usize,
) -> Result<Vec<WindowSpec>, WfoptError> {
    if train_len == 0 {
        return Err(WfoptError::configuration("train_len must be positive"));
    }
    if test_len == 0 {
        return Err(WfoptError::configuration("test_len must be positive"));
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    // Bounds past usize::MAX cannot fit in any series.
    while let Some((train_end, test_end)) = start
        .checked_add(train_len)
        .and_then(|train_end| Some((train_end, train_end.checked_add(test_len)?)))
    {
        if test_end > len {
            break;
        }
        windows.push(WindowSpec {
            train_start: start,
            train_end,
            test_start: train_end,
            test_end,
        });
        start += test_len;
    }
    Ok(windows)
}

/// Candidate parameters in canonical ascending `(fast, slow)` order, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGrid {
    candidates: Vec<SignalParameters>,
}

impl ParameterGrid {
    pub fn new(candidates: impl IntoIterator<Item = SignalParameters>) -> Self {
        let set: BTreeSet<SignalParameters> = candidates.into_iter().collect();
        Self {
            candidates: set.into_iter().collect(),
        }
    }

    /// Cartesian product of the two window lists, keeping only `fast < slow`.
    pub fn from_windows(fast_windows: &[usize], slow_windows: &[usize]) -> Self {
        Self::new(fast_windows.iter().flat_map(|&fast| {
            slow_windows
                .iter()
                .filter_map(move |&slow| SignalParameters::new(fast, slow).ok())
        }))
    }

    pub fn candidates(&self) -> &[SignalParameters] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl Default for ParameterGrid {
    /// Fast 5/10/15 against slow 20/30/40/50.
    fn default() -> Self {
        Self::from_windows(&[5, 10, 15], &[20, 30, 40, 50])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub parameters: SignalParameters,
    /// Compounded train-slice return as a fraction.
    pub in_sample_fitness: f64,
    /// Compounded test-slice return as a fraction.
    pub out_of_sample_fitness: f64,
    pub out_of_sample_return_pct: f64,
    /// Holding the test slice start to end, in percent.
    pub buy_and_hold_return_pct: f64,
    pub window: WindowSpec,
}

/// Caps on the outer window loop. Hitting a cap truncates the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunBudget {
    pub max_windows: Option<usize>,
    pub max_duration: Option<Duration>,
}

impl RunBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    fn exhausted(&self, processed: usize, started: Instant) -> bool {
        if self.max_windows.is_some_and(|max| processed >= max) {
            return true;
        }
        self.max_duration
            .is_some_and(|max| started.elapsed() >= max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardConfig {
    pub train_len: usize,
    pub test_len: usize,
    pub costs: CostModel,
    pub budget: RunBudget,
}

impl WalkForwardConfig {
    pub fn new(train_len: usize, test_len: usize) -> Self {
        Self {
            train_len,
            test_len,
            costs: CostModel::none(),
            budget: RunBudget::unlimited(),
        }
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_budget(mut self, budget: RunBudget) -> Self {
        self.budget = budget;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardOutcome {
    pub results: Vec<EvaluationResult>,
    /// Windows that fit the series, whether or not they were processed.
    pub windows_planned: usize,
    /// True when the budget stopped the run before every window was processed.
    pub truncated: bool,
}

/// Cost-free walk-forward search with no budget.
pub fn run(
    prices: &PriceSeries,
    train_len: usize,
    test_len: usize,
    param_grid: &ParameterGrid,
) -> Result<Vec<EvaluationResult>, WfoptError> {
    let config = WalkForwardConfig::new(train_len, test_len);
    Ok(run_with_config(prices, &config, param_grid)?.results)
}

pub fn run_with_config(
    prices: &PriceSeries,
    config: &WalkForwardConfig,
    param_grid: &ParameterGrid,
) -> Result<WalkForwardOutcome, WfoptError> {
    if param_grid.is_empty() {
        return Err(WfoptError::configuration(
            "parameter grid is empty, nothing to select from",
        ));
    }

    let windows = generate_windows(prices.len(), config.train_len, config.test_len)?;
    info!(
        bars = prices.len(),
        train_len = config.train_len,
        test_len = config.test_len,
        candidates = param_grid.len(),
        windows = windows.len(),
        "starting walk-forward run"
    );

    let started = Instant::now();
    let mut results = Vec::with_capacity(windows.len());
    let mut truncated = false;

    for (index, window) in windows.iter().enumerate() {
        if config.budget.exhausted(results.len(), started) {
            warn!(
                processed = results.len(),
                planned = windows.len(),
                "run budget exhausted, returning partial results"
            );
            truncated = true;
            break;
        }

        let result = evaluate_window(prices, *window, param_grid, config.costs)?;
        debug!(
            window = index,
            params = %result.parameters,
            in_sample_pct = result.in_sample_fitness * 100.0,
            out_of_sample_pct = result.out_of_sample_return_pct,
            "window evaluated"
        );
        results.push(result);
    }

    info!(windows = results.len(), truncated, "walk-forward run complete");
    Ok(WalkForwardOutcome {
        results,
        windows_planned: windows.len(),
        truncated,
    })
}

/// Selects on the train slice, then scores the choice on the test slice.
pub fn evaluate_window(
    prices: &PriceSeries,
    window: WindowSpec,
    param_grid: &ParameterGrid,
    costs: CostModel,
) -> Result<EvaluationResult, WfoptError> {
    let train = prices.slice(window.train_range());
    let (parameters, in_sample_fitness) = select_parameters(train, param_grid, costs)?;

    let test = prices.slice(window.test_range());
    let signal = generate(test, parameters);
    let out_of_sample = evaluate(test, &signal, costs)?;

    Ok(EvaluationResult {
        parameters,
        in_sample_fitness,
        out_of_sample_fitness: out_of_sample.fitness,
        out_of_sample_return_pct: out_of_sample.fitness * 100.0,
        buy_and_hold_return_pct: buy_and_hold_return(test) * 100.0,
        window,
    })
}

/// Candidate with the strictly greatest fitness on `prices`. Ties keep the
/// earliest candidate in canonical grid order.
pub fn select_parameters(
    prices: SeriesSlice<'_>,
    param_grid: &ParameterGrid,
    costs: CostModel,
) -> Result<(SignalParameters, f64), WfoptError> {
    let scores = score_candidates(prices, param_grid.candidates(), costs)?;

    let mut best: Option<(SignalParameters, f64)> = None;
    for (params, fitness) in param_grid.candidates().iter().zip(scores) {
        match best {
            Some((_, best_fitness)) if fitness <= best_fitness => {}
            _ => best = Some((*params, fitness)),
        }
    }

    best.ok_or_else(|| WfoptError::configuration("parameter grid is empty"))
}

fn fitness_for(
    prices: SeriesSlice<'_>,
    params: SignalParameters,
    costs: CostModel,
) -> Result<f64, WfoptError> {
    let signal = generate(prices, params);
    Ok(evaluate(prices, &signal, costs)?.fitness)
}

#[cfg(not(feature = "parallel"))]
fn score_candidates(
    prices: SeriesSlice<'_>,
    candidates: &[SignalParameters],
    costs: CostModel,
) -> Result<Vec<f64>, WfoptError> {
    candidates
        .iter()
        .map(|params| fitness_for(prices, *params, costs))
        .collect()
}

// Scores come back in candidate order, so selection is unchanged.
#[cfg(feature = "parallel")]
fn score_candidates(
    prices: SeriesSlice<'_>,
    candidates: &[SignalParameters],
    costs: CostModel,
) -> Result<Vec<f64>, WfoptError> {
    use rayon::prelude::*;

    candidates
        .par_iter()
        .map(|params| fitness_for(prices, *params, costs))
        .collect()
}
