//! Configuration validation.
//!
//! Validates all config fields before any symbol is processed.

use crate::domain::chart::ChartOptions;
use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::Interval;
use crate::domain::params::{
    DEFAULT_BREAKOUT_MARGIN, DEFAULT_FAST_WINDOW, DEFAULT_HOLDING_DURATION, DEFAULT_SLOW_WINDOW,
    DEFAULT_SPREAD, DEFAULT_STOP_LOSS_PCT, StrategyKind, TRADING_DAYS_PER_YEAR,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    validate_data_source(config)?;
    validate_dates(config)?;
    validate_interval(config)?;
    validate_windows(config)?;
    validate_fractions(config)?;
    validate_strategy(config)?;
    validate_annualization(config)?;
    validate_output(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendscopeError {
    TrendscopeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(TrendscopeError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            });
        }
    }
    if config.get_list("data", "symbols").is_empty() {
        return Err(TrendscopeError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TrendscopeError> {
    match value {
        None => Err(TrendscopeError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "data",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(s) = config.get_string("data", "interval") {
        s.parse::<Interval>()
            .map_err(|reason| invalid("data", "interval", &reason))?;
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    for key in ["fast_window", "slow_window", "rsi_window", "volatility_window", "support_run"] {
        if config.get_int("indicators", key, 1)? < 1 {
            return Err(invalid("indicators", key, "window must be at least 1"));
        }
    }
    let fast = config.get_int("indicators", "fast_window", DEFAULT_FAST_WINDOW as i64)?;
    let slow = config.get_int("indicators", "slow_window", DEFAULT_SLOW_WINDOW as i64)?;
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "fast_window",
            "fast_window must be shorter than slow_window",
        ));
    }
    if config.get_int("signal", "duration", DEFAULT_HOLDING_DURATION as i64)? < 1 {
        return Err(invalid("signal", "duration", "duration must be at least 1"));
    }
    Ok(())
}

fn validate_fractions(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let stop_loss = config.get_double("indicators", "stop_loss", DEFAULT_STOP_LOSS_PCT)?;
    if !(0.0..1.0).contains(&stop_loss) {
        return Err(invalid(
            "indicators",
            "stop_loss",
            "stop_loss must be between 0 and 1",
        ));
    }
    let margin = config.get_double("signal", "breakout_margin", DEFAULT_BREAKOUT_MARGIN)?;
    if !(0.0..1.0).contains(&margin) {
        return Err(invalid(
            "signal",
            "breakout_margin",
            "breakout_margin must be between 0 and 1",
        ));
    }
    if config.get_double("signal", "spread", DEFAULT_SPREAD)? < 0.0 {
        return Err(invalid("signal", "spread", "spread must be non-negative"));
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(s) = config.get_string("signal", "strategy") {
        s.parse::<StrategyKind>()
            .map_err(|reason| invalid("signal", "strategy", &reason))?;
    }
    Ok(())
}

fn validate_annualization(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if config.get_double("performance", "annualization", TRADING_DAYS_PER_YEAR)? <= 0.0 {
        return Err(invalid(
            "performance",
            "annualization",
            "annualization must be positive",
        ));
    }
    Ok(())
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    config.get_bool("output", "charts", true)?;
    config.get_bool("output", "clear", false)?;
    parse_chart_options(config)?;
    Ok(())
}

/// Reads the optional `[output]` chart selection: `year`, `compare_years`
/// (two years) and `compare_month` (1-12, needs `compare_years`).
pub fn parse_chart_options(config: &dyn ConfigPort) -> Result<ChartOptions, TrendscopeError> {
    let year = optional_year(config, "year")?;

    let compare_years = match config.get_list("output", "compare_years").as_slice() {
        [] => None,
        [first, second] => Some((
            parse_year(first, "compare_years")?,
            parse_year(second, "compare_years")?,
        )),
        _ => {
            return Err(invalid(
                "output",
                "compare_years",
                "expected two comma-separated years",
            ));
        }
    };

    let compare_month = match config.get_int("output", "compare_month", 0)? {
        0 => None,
        m @ 1..=12 => Some(m as u32),
        _ => return Err(invalid("output", "compare_month", "month must be between 1 and 12")),
    };
    if compare_month.is_some() && compare_years.is_none() {
        return Err(TrendscopeError::ConfigMissing {
            section: "output".to_string(),
            key: "compare_years".to_string(),
        });
    }

    Ok(ChartOptions {
        signals_year: year,
        compare_years,
        compare_month,
    })
}

fn optional_year(config: &dyn ConfigPort, key: &str) -> Result<Option<i32>, TrendscopeError> {
    match config.get_string("output", key) {
        Some(s) if !s.trim().is_empty() => parse_year(&s, key).map(Some),
        _ => Ok(None),
    }
}

fn parse_year(value: &str, key: &str) -> Result<i32, TrendscopeError> {
    match value.trim().parse::<i32>() {
        Ok(y) if (1900..=2200).contains(&y) => Ok(y),
        _ => Err(invalid("output", key, &format!("'{}' is not a year", value.trim()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[data]
dir = ./data
symbols = AAPL, MSFT
start_date = 2023-01-01
end_date = 2024-01-01
interval = 1d

[indicators]
fast_window = 30
slow_window = 60

[signal]
strategy = breakout
"#;

    fn replaced(from: &str, to: &str) -> FileConfigAdapter {
        assert!(VALID.contains(from));
        FileConfigAdapter::from_string(&VALID.replace(from, to)).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let adapter = FileConfigAdapter::from_string(VALID).unwrap();
        assert!(validate_config(&adapter).is_ok());
    }

    #[test]
    fn missing_symbols_is_reported() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ndir = ./data\nstart_date = 2023-01-01\nend_date = 2024-01-01\n",
        )
        .unwrap();
        let err = validate_config(&adapter).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigMissing { ref key, .. } if key == "symbols"));
    }

    #[test]
    fn reversed_dates_are_invalid() {
        let err = validate_config(&replaced("end_date = 2024-01-01", "end_date = 2022-01-01")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_date_format_is_invalid() {
        let err = validate_config(&replaced("start_date = 2023-01-01", "start_date = 01/02/2023")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { .. }));
    }

    #[test]
    fn unknown_interval_is_invalid() {
        let err = validate_config(&replaced("interval = 1d", "interval = 1w")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "interval"));
    }

    #[test]
    fn fast_window_must_be_shorter() {
        let err = validate_config(&replaced("fast_window = 30", "fast_window = 90")).unwrap_err();
        assert!(
            matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "fast_window")
        );
    }

    #[test]
    fn unknown_strategy_is_invalid() {
        let err = validate_config(&replaced("strategy = breakout", "strategy = momentum")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "strategy"));
    }

    #[test]
    fn non_numeric_window_is_invalid() {
        let err = validate_config(&replaced("fast_window = 30", "fast_window = abc")).unwrap_err();
        assert!(
            matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "fast_window")
        );
    }

    #[test]
    fn non_numeric_fraction_is_invalid() {
        let err = validate_config(&replaced("strategy = breakout", "strategy = breakout\nbreakout_margin = half")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "breakout_margin"));
    }

    #[test]
    fn chart_options_default_to_none() {
        let options = parse_chart_options(&FileConfigAdapter::from_string(VALID).unwrap()).unwrap();
        assert_eq!(options, ChartOptions::default());
    }

    #[test]
    fn chart_options_read_output_section() {
        let adapter = replaced(
            "[signal]",
            "[output]\nyear = 2023\ncompare_years = 2022, 2023\ncompare_month = 7\n\n[signal]",
        );
        assert!(validate_config(&adapter).is_ok());
        let options = parse_chart_options(&adapter).unwrap();
        assert_eq!(options.signals_year, Some(2023));
        assert_eq!(options.compare_years, Some((2022, 2023)));
        assert_eq!(options.compare_month, Some(7));
    }

    #[test]
    fn compare_years_needs_two_years() {
        let err = validate_config(&replaced("[signal]", "[output]\ncompare_years = 2022\n\n[signal]")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "compare_years"));
    }

    #[test]
    fn compare_month_out_of_range_is_invalid() {
        let err = validate_config(&replaced(
            "[signal]",
            "[output]\ncompare_years = 2022, 2023\ncompare_month = 13\n\n[signal]",
        ))
        .unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "compare_month"));
    }

    #[test]
    fn compare_month_without_years_is_missing() {
        let err = validate_config(&replaced("[signal]", "[output]\ncompare_month = 7\n\n[signal]")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigMissing { ref key, .. } if key == "compare_years"));
    }

    #[test]
    fn bad_signals_year_is_invalid() {
        let err = validate_config(&replaced("[signal]", "[output]\nyear = last\n\n[signal]")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "year"));
    }

    #[test]
    fn negative_spread_is_invalid() {
        let err = validate_config(&replaced("strategy = breakout", "strategy = breakout\nspread = -0.1")).unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigInvalid { ref key, .. } if key == "spread"));
    }
}
