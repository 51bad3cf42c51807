//! Configuration validation.
//!
//! Validates every config field before a walk-forward run starts. The
//! symbol is resolved separately since the command line may supply it.

use crate::domain::error::WfoptError;
use crate::domain::period::{LookbackPeriod, months_to_bars};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const SOURCES: [&str; 2] = ["csv", "synthetic"];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    validate_source(config)?;
    validate_period(config)?;
    validate_end_date(config)?;
    validate_start_price(config)?;
    Ok(())
}

pub fn validate_walk_forward_config(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    resolve_length(config, "train")?;
    resolve_length(config, "test")?;
    validate_windows(config)?;
    validate_cost(config, "commission_pct")?;
    validate_cost(config, "slippage_pct")?;
    validate_budget(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> WfoptError {
    WfoptError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> WfoptError {
    WfoptError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    let source = source.trim().to_lowercase();

    if !SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected csv or synthetic", source),
        ));
    }

    if source == "csv" {
        match config.get_string("data", "csv_dir") {
            Some(s) if !s.trim().is_empty() => {}
            _ => return Err(missing("data", "csv_dir")),
        }
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    if let Some(s) = config.get_string("data", "period") {
        s.parse::<LookbackPeriod>()
            .map_err(|e| invalid("data", "period", e.to_string()))?;
    }
    Ok(())
}

fn validate_end_date(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    if let Some(s) = config.get_string("data", "end_date") {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| invalid("data", "end_date", "invalid date format, expected YYYY-MM-DD"))?;
    }
    Ok(())
}

fn validate_start_price(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    if let Some(s) = config.get_string("data", "start_price") {
        match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => {}
            _ => return Err(invalid("data", "start_price", "start_price must be a positive number")),
        }
    }
    Ok(())
}

/// Window length in bars for `prefix` (`train` or `test`).
///
/// `<prefix>_bars` takes precedence over `<prefix>_months`; one is required.
/// Months convert at [`crate::domain::period::TRADING_DAYS_PER_MONTH`] bars each.
pub fn resolve_length(config: &dyn ConfigPort, prefix: &str) -> Result<usize, WfoptError> {
    let bars_key = format!("{}_bars", prefix);
    let months_key = format!("{}_months", prefix);

    let (key, bars) = if config.get_string("walk_forward", &bars_key).is_some() {
        let value = positive(config.get_int("walk_forward", &bars_key, 0));
        (bars_key, value)
    } else if config.get_string("walk_forward", &months_key).is_some() {
        let months = positive(config.get_int("walk_forward", &months_key, 0));
        if let Some(m) = months {
            let bars = months_to_bars(m).ok_or_else(|| {
                invalid(
                    "walk_forward",
                    &months_key,
                    format!("{} months is too long a window", m),
                )
            })?;
            return Ok(bars);
        }
        (months_key, None)
    } else {
        return Err(missing("walk_forward", &months_key));
    };

    bars.ok_or_else(|| invalid("walk_forward", &key, format!("{} must be a positive integer", key)))
}

fn positive(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&v| v > 0)
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    let mut lists = Vec::new();
    for key in ["fast_windows", "slow_windows"] {
        match config.get_usize_list("walk_forward", key) {
            None => lists.push(None),
            Some(Ok(v)) if v.is_empty() => {
                return Err(invalid("walk_forward", key, "window list is empty"));
            }
            Some(Ok(v)) => lists.push(Some(v)),
            Some(Err(token)) => {
                return Err(invalid(
                    "walk_forward",
                    key,
                    format!("'{}' is not a positive integer", token),
                ));
            }
        }
    }

    // Absent lists fall back to the default grid, which always has pairs.
    if let [Some(fast), Some(slow)] = lists.as_slice() {
        let any_pair = fast.iter().any(|f| slow.iter().any(|s| f < s));
        if !any_pair {
            return Err(invalid(
                "walk_forward",
                "slow_windows",
                "no fast window is smaller than any slow window",
            ));
        }
    }
    Ok(())
}

fn validate_cost(config: &dyn ConfigPort, key: &str) -> Result<(), WfoptError> {
    let value = config.get_double("walk_forward", key, 0.0);
    if value < 0.0 {
        return Err(invalid("walk_forward", key, format!("{} must be non-negative", key)));
    }
    Ok(())
}

fn validate_budget(config: &dyn ConfigPort) -> Result<(), WfoptError> {
    if config.get_int("walk_forward", "max_windows", 0) < 0 {
        return Err(invalid("walk_forward", "max_windows", "max_windows must be non-negative"));
    }
    if config.get_double("walk_forward", "time_budget_secs", 0.0) < 0.0 {
        return Err(invalid(
            "walk_forward",
            "time_budget_secs",
            "time_budget_secs must be non-negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = r#"
[data]
source = csv
csv_dir = ./data
symbol = AAPL
period = 2y

[walk_forward]
train_months = 6
test_months = 3
fast_windows = 5,10,15
slow_windows = 20,30,40,50
commission_pct = 0.001
slippage_pct = 0.0005
max_windows = 0
time_budget_secs = 0
"#;

    #[test]
    fn valid_config_passes() {
        let config = make_config(VALID);
        assert!(validate_data_config(&config).is_ok());
        assert!(validate_walk_forward_config(&config).is_ok());
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[data]\nsource = yahoo\nsymbol = AAPL\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn csv_source_requires_dir() {
        let config = make_config("[data]\nsource = csv\nsymbol = AAPL\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn synthetic_source_needs_no_dir() {
        let config = make_config("[data]\nsource = synthetic\nsymbol = AAPL\n");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn symbol_may_come_from_command_line() {
        let config = make_config("[data]\nsource = synthetic\n");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn bad_period_fails() {
        let config = make_config("[data]\nsource = synthetic\nsymbol = AAPL\nperiod = 4y\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "period"));
    }

    #[test]
    fn bad_end_date_fails() {
        let config =
            make_config("[data]\nsource = synthetic\nsymbol = AAPL\nend_date = 31/12/2024\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "end_date"));
    }

    #[test]
    fn non_positive_start_price_fails() {
        for value in ["0", "-5", "abc"] {
            let config = make_config(&format!(
                "[data]\nsource = synthetic\nsymbol = AAPL\nstart_price = {}\n",
                value
            ));
            let err = validate_data_config(&config).unwrap_err();
            assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "start_price"));
        }
    }

    #[test]
    fn missing_train_length_fails() {
        let config = make_config("[walk_forward]\ntest_months = 3\n");
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigMissing { key, .. } if key == "train_months"));
    }

    #[test]
    fn bars_take_precedence_over_months() {
        let config =
            make_config("[walk_forward]\ntrain_bars = 0\ntrain_months = 6\ntest_bars = 20\n");
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "train_bars"));
    }

    #[test]
    fn negative_test_months_fails() {
        let config = make_config("[walk_forward]\ntrain_months = 6\ntest_months = -1\n");
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "test_months"));
    }

    #[test]
    fn overlong_months_fail() {
        let config = make_config(
            "[walk_forward]\ntrain_months = 1000000000000000000\ntest_months = 3\n",
        );
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "train_months"));
    }

    #[test]
    fn resolve_length_converts_months() {
        let config = make_config("[walk_forward]\ntrain_months = 6\ntest_bars = 15\n");
        assert_eq!(resolve_length(&config, "train").unwrap(), 126);
        assert_eq!(resolve_length(&config, "test").unwrap(), 15);
    }

    #[test]
    fn bad_window_token_fails() {
        let config = make_config(
            "[walk_forward]\ntrain_bars = 100\ntest_bars = 20\nfast_windows = 5,ten\n",
        );
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "fast_windows"));
    }

    #[test]
    fn grid_without_valid_pair_fails() {
        let config = make_config(
            "[walk_forward]\ntrain_bars = 100\ntest_bars = 20\nfast_windows = 30,40\nslow_windows = 10,20\n",
        );
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "slow_windows"));
    }

    #[test]
    fn negative_commission_fails() {
        let config = make_config(
            "[walk_forward]\ntrain_bars = 100\ntest_bars = 20\ncommission_pct = -0.1\n",
        );
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "commission_pct"));
    }

    #[test]
    fn negative_budget_fails() {
        let config =
            make_config("[walk_forward]\ntrain_bars = 100\ntest_bars = 20\nmax_windows = -2\n");
        let err = validate_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, WfoptError::ConfigInvalid { key, .. } if key == "max_windows"));
    }
}
