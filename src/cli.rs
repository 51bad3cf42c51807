//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_adapter::SyntheticAdapter;
use crate::domain::config_validation::{
    resolve_length, validate_data_config, validate_walk_forward_config,
};
use crate::domain::error::WfoptError;
use crate::domain::evaluator::{CostModel, buy_and_hold_return, evaluate};
use crate::domain::period::LookbackPeriod;
use crate::domain::signal::{SignalParameters, generate};
use crate::domain::summary::WalkForwardSummary;
use crate::domain::walk_forward::{
    ParameterGrid, RunBudget, WalkForwardConfig, WalkForwardOutcome, run_with_config,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportInput, ReportPort};

pub const DEFAULT_PERIOD: LookbackPeriod = LookbackPeriod::TwoYears;
pub const DEFAULT_OUTPUT: &str = "walk_forward.csv";

/// Last bar date of the synthetic provider when `[data] end_date` is unset.
pub fn default_synthetic_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN)
}

#[derive(Parser, Debug)]
#[command(name = "wfopt", about = "Walk-forward SMA crossover optimiser")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a walk-forward parameter search
    WalkForward {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest one parameter pair over the full series
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        fast: usize,
        #[arg(long)]
        slow: usize,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        period: Option<String>,
    },
    /// Validate a configuration file without fetching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols the configured data source can provide
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::WalkForward {
            config,
            symbol,
            period,
            output,
        } => run_walk_forward(&config, symbol.as_deref(), period.as_deref(), output),
        Command::Evaluate {
            config,
            fast,
            slow,
            symbol,
            period,
        } => run_evaluate(&config, fast, slow, symbol.as_deref(), period.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(err: &WfoptError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn run_walk_forward(
    config_path: &Path,
    symbol_override: Option<&str>,
    period_override: Option<&str>,
    output_override: Option<PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_data_config(&adapter).and_then(|_| validate_walk_forward_config(&adapter))
    {
        return fail(&e);
    }

    // Stage 3: Build domain values
    let built = resolve_symbol(symbol_override, &adapter).and_then(|symbol| {
        Ok((
            symbol,
            resolve_period(period_override, &adapter)?,
            build_walk_forward_config(&adapter)?,
            build_parameter_grid(&adapter)?,
            build_data_port(&adapter)?,
        ))
    });
    let (symbol, period, wf_config, grid, data_port) = match built {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    let output = output_override
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let print_windows = adapter.get_bool("report", "print_windows", true);

    // Stages 4-7: fetch, search, summarise, report
    match run_walk_forward_pipeline(
        data_port.as_ref(),
        &symbol,
        period,
        &wf_config,
        &grid,
        &CsvReportAdapter,
        &output,
        print_windows,
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, WfoptError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WfoptError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

pub fn resolve_period(
    period_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<LookbackPeriod, WfoptError> {
    match period_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "period"))
    {
        Some(p) => p.parse(),
        None => Ok(DEFAULT_PERIOD),
    }
}

pub fn build_walk_forward_config(config: &dyn ConfigPort) -> Result<WalkForwardConfig, WfoptError> {
    let train_len = resolve_length(config, "train")?;
    let test_len = resolve_length(config, "test")?;

    let costs = CostModel::new(
        config.get_double("walk_forward", "commission_pct", 0.0),
        config.get_double("walk_forward", "slippage_pct", 0.0),
    )?;

    let max_windows = config.get_int("walk_forward", "max_windows", 0);
    let time_budget = config.get_double("walk_forward", "time_budget_secs", 0.0);
    let budget = RunBudget {
        max_windows: usize::try_from(max_windows).ok().filter(|&n| n > 0),
        max_duration: (time_budget > 0.0)
            .then(|| Duration::try_from_secs_f64(time_budget).ok())
            .flatten(),
    };

    Ok(WalkForwardConfig::new(train_len, test_len)
        .with_costs(costs)
        .with_budget(budget))
}

pub fn build_parameter_grid(config: &dyn ConfigPort) -> Result<ParameterGrid, WfoptError> {
    let list = |key: &str| -> Result<Option<Vec<usize>>, WfoptError> {
        match config.get_usize_list("walk_forward", key) {
            None => Ok(None),
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(token)) => Err(WfoptError::ConfigInvalid {
                section: "walk_forward".into(),
                key: key.to_string(),
                reason: format!("'{}' is not a positive integer", token),
            }),
        }
    };

    let grid = match (list("fast_windows")?, list("slow_windows")?) {
        (None, None) => ParameterGrid::default(),
        (fast, slow) => ParameterGrid::from_windows(
            &fast.unwrap_or_else(|| vec![5, 10, 15]),
            &slow.unwrap_or_else(|| vec![20, 30, 40, 50]),
        ),
    };

    if grid.is_empty() {
        return Err(WfoptError::configuration(
            "parameter grid has no pair with fast_window < slow_window",
        ));
    }
    Ok(grid)
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, WfoptError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| WfoptError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir.trim()))))
        }
        "synthetic" => {
            let symbols = config
                .get_string("data", "symbols")
                .or_else(|| config.get_string("data", "symbol"))
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let end_date = match config.get_string("data", "end_date") {
                Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                    WfoptError::ConfigInvalid {
                        section: "data".into(),
                        key: "end_date".into(),
                        reason: "invalid date format, expected YYYY-MM-DD".into(),
                    }
                })?,
                None => default_synthetic_end(),
            };
            let mut adapter = SyntheticAdapter::new(symbols, end_date);
            if let Some(raw) = config.get_string("data", "start_price") {
                let start_price = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite() && *p > 0.0)
                    .ok_or_else(|| WfoptError::ConfigInvalid {
                        section: "data".into(),
                        key: "start_price".into(),
                        reason: "start_price must be a positive number".into(),
                    })?;
                adapter = adapter.with_start_price(start_price);
            }
            Ok(Box::new(adapter))
        }
        other => Err(WfoptError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}'", other),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_walk_forward_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    period: LookbackPeriod,
    wf_config: &WalkForwardConfig,
    grid: &ParameterGrid,
    report_port: &dyn ReportPort,
    output: &Path,
    print_windows: bool,
) -> Result<WalkForwardOutcome, WfoptError> {
    // Stage 4: Fetch
    eprintln!("Fetching {} ({})", symbol, period);
    let prices = data_port.fetch(symbol, period)?;
    eprintln!(
        "  {} bars, {} to {}",
        prices.len(),
        prices.first_timestamp().date(),
        prices.last_timestamp().date()
    );

    // Stage 5: Search
    eprintln!(
        "Running walk-forward: train {} bars, test {} bars, {} candidates",
        wf_config.train_len,
        wf_config.test_len,
        grid.len()
    );
    if !wf_config.costs.is_free() {
        eprintln!(
            "  costs: commission {:.4}%, slippage {:.4}% per position change",
            wf_config.costs.commission_pct * 100.0,
            wf_config.costs.slippage_pct * 100.0
        );
    }
    let outcome = run_with_config(&prices, wf_config, grid)?;

    if outcome.windows_planned == 0 {
        eprintln!(
            "No full train/test window fits {} bars (need {}).",
            prices.len(),
            wf_config.train_len + wf_config.test_len
        );
    }
    if outcome.truncated {
        eprintln!(
            "warning: run budget reached after {} of {} windows, results are partial",
            outcome.results.len(),
            outcome.windows_planned
        );
    }

    let timestamps: Vec<_> = prices.bars().iter().map(|b| b.timestamp).collect();

    // Stage 6: Console summary
    if print_windows && !outcome.results.is_empty() {
        eprintln!("\n=== Windows ===");
        for (i, r) in outcome.results.iter().enumerate() {
            eprintln!(
                "  {:>3}  {} to {}  {:<16} IS {:>8.2}%  OOS {:>8.2}%  B&H {:>8.2}%",
                i,
                timestamps[r.window.test_start].date(),
                timestamps[r.window.test_end - 1].date(),
                r.parameters.to_string(),
                r.in_sample_fitness * 100.0,
                r.out_of_sample_return_pct,
                r.buy_and_hold_return_pct,
            );
        }
    }

    let summary = WalkForwardSummary::compute(&outcome.results);
    print_summary(&summary);

    // Stage 7: Report
    let input = ReportInput {
        results: &outcome.results,
        timestamps: &timestamps,
    };
    report_port.write(&input, &output.display().to_string())?;
    eprintln!("\nReport written to: {}", output.display());

    Ok(outcome)
}

fn print_summary(summary: &WalkForwardSummary) {
    eprintln!("\n=== Walk-Forward Summary ===");
    eprintln!("Windows:            {}", summary.windows);
    if summary.windows == 0 {
        return;
    }
    eprintln!("Average OOS Return: {:.2}%", summary.average_return_pct);
    eprintln!("Compounded OOS:     {:.2}%", summary.compounded_return_pct);
    eprintln!("Win Rate:           {:.1}%", summary.win_rate * 100.0);
    eprintln!("Average B&H:        {:.2}%", summary.average_buy_and_hold_pct);
    eprintln!("Average IS Return:  {:.2}%", summary.average_in_sample_pct);
    eprintln!("Efficiency:         {:.2}", summary.efficiency);
    if let (Some(best), Some(worst)) = (summary.best_window, summary.worst_window) {
        eprintln!("Best Window:        {}", best);
        eprintln!("Worst Window:       {}", worst);
    }
    if let Some((params, count)) = summary.most_selected {
        eprintln!("Most Selected:      {} ({} windows)", params, count);
    }
}

fn run_evaluate(
    config_path: &Path,
    fast: usize,
    slow: usize,
    symbol_override: Option<&str>,
    period_override: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&adapter) {
        return fail(&e);
    }

    let result = (|| -> Result<(), WfoptError> {
        let params = SignalParameters::new(fast, slow)?;
        let symbol = resolve_symbol(symbol_override, &adapter)?;
        let period = resolve_period(period_override, &adapter)?;
        let costs = CostModel::new(
            adapter.get_double("walk_forward", "commission_pct", 0.0),
            adapter.get_double("walk_forward", "slippage_pct", 0.0),
        )?;
        let data_port = build_data_port(&adapter)?;

        eprintln!("Fetching {} ({})", symbol, period);
        let prices = data_port.fetch(&symbol, period)?;
        let slice = prices.as_slice();
        let signal = generate(slice, params);
        let evaluation = evaluate(slice, &signal, costs)?;

        eprintln!("\n=== {} on {} ===", params, symbol);
        eprintln!("Bars:             {}", prices.len());
        eprintln!("Bars Long:        {}", signal.long_bars());
        eprintln!("Strategy Return:  {:.2}%", evaluation.return_pct());
        eprintln!(
            "Buy & Hold:       {:.2}%",
            buy_and_hold_return(slice) * 100.0
        );
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_data_config(&adapter)
        .and_then(|_| validate_walk_forward_config(&adapter))
        .and_then(|_| {
            Ok((
                resolve_symbol(None, &adapter)?,
                resolve_period(None, &adapter)?,
                build_walk_forward_config(&adapter)?,
                build_parameter_grid(&adapter)?,
            ))
        });

    let (symbol, period, wf_config, grid) = match checked {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    eprintln!("\nData:");
    eprintln!("  symbol: {}", symbol);
    eprintln!("  period: {} (~{} bars)", period, period.approx_trading_days());
    eprintln!("\nWalk-forward:");
    eprintln!("  train: {} bars", wf_config.train_len);
    eprintln!("  test:  {} bars", wf_config.test_len);
    eprintln!(
        "  expected windows: {}",
        expected_windows(period.approx_trading_days(), &wf_config)
    );
    eprintln!("\nCandidates ({}):", grid.len());
    for params in grid.candidates() {
        eprintln!("  {}", params);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn expected_windows(bars: usize, wf_config: &WalkForwardConfig) -> usize {
    let span = wf_config.train_len + wf_config.test_len;
    if bars < span || wf_config.test_len == 0 {
        0
    } else {
        (bars - span) / wf_config.test_len + 1
    }
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let symbols = match build_data_port(&adapter).and_then(|port| port.list_symbols()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
