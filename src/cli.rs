//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::console_report::{format_report, prepare_output_dir};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgChartAdapter;
use crate::domain::chart::{
    ChartOptions, compare_month_chart, compare_years_chart, drawdown_chart, profits_chart,
    signals_chart, support_resistance_chart, view_sma_chart,
};
use crate::domain::config_validation::{parse_chart_options, parse_date, validate_config};
use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::Interval;
use crate::domain::params::{
    DEFAULT_BREAKOUT_MARGIN, DEFAULT_FAST_WINDOW, DEFAULT_HOLDING_DURATION, DEFAULT_RSI_WINDOW,
    DEFAULT_SLOW_WINDOW, DEFAULT_SPREAD, DEFAULT_STOP_LOSS_PCT, DEFAULT_SUPPORT_RUN,
    DEFAULT_VOLATILITY_WINDOW, IndicatorParams, PerformanceParams, PipelineParams, SignalParams,
    StrategyKind, TRADING_DAYS_PER_YEAR,
};
use crate::domain::pipeline::{AnalysisRequest, SymbolReport, run_universe};
use crate::ports::chart_port::ChartPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

const DEFAULT_OUTPUT_DIR: &str = "./img/";

#[derive(Parser, Debug)]
#[command(name = "trendscope", about = "Trend-following signal analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse the configured symbols and render charts
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Analyse only this symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Chart output directory (overrides [output] dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_charts: bool,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with price files in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            symbol,
            output,
            no_charts,
        } => run_analysis(&config, symbol.as_deref(), output.as_ref(), no_charts),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TrendscopeError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_validated(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = load_config(path)?;
    validate_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(adapter)
}

fn window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, TrendscopeError> {
    let value = config.get_int("indicators", key, default as i64)?;
    usize::try_from(value).map_err(|_| TrendscopeError::ConfigInvalid {
        section: "indicators".into(),
        key: key.into(),
        reason: format!("{value} is not a valid window"),
    })
}

pub fn build_params(config: &dyn ConfigPort) -> Result<PipelineParams, TrendscopeError> {
    let strategy = match config.get_string("signal", "strategy") {
        Some(s) => s
            .parse::<StrategyKind>()
            .map_err(|reason| TrendscopeError::ConfigInvalid {
                section: "signal".into(),
                key: "strategy".into(),
                reason,
            })?,
        None => StrategyKind::Crossover,
    };
    let duration = config.get_int("signal", "duration", DEFAULT_HOLDING_DURATION as i64)?;
    let duration = usize::try_from(duration).map_err(|_| TrendscopeError::ConfigInvalid {
        section: "signal".into(),
        key: "duration".into(),
        reason: format!("{duration} is not a valid duration"),
    })?;

    Ok(PipelineParams {
        indicators: IndicatorParams {
            fast_window: window(config, "fast_window", DEFAULT_FAST_WINDOW)?,
            slow_window: window(config, "slow_window", DEFAULT_SLOW_WINDOW)?,
            rsi_window: window(config, "rsi_window", DEFAULT_RSI_WINDOW)?,
            volatility_window: window(config, "volatility_window", DEFAULT_VOLATILITY_WINDOW)?,
            support_run: window(config, "support_run", DEFAULT_SUPPORT_RUN)?,
            stop_loss_pct: config.get_double("indicators", "stop_loss", DEFAULT_STOP_LOSS_PCT)?,
        },
        signal: SignalParams {
            strategy,
            breakout_margin: config.get_double(
                "signal",
                "breakout_margin",
                DEFAULT_BREAKOUT_MARGIN,
            )?,
            duration,
            spread: config.get_double("signal", "spread", DEFAULT_SPREAD)?,
        },
        performance: PerformanceParams {
            annualization: config.get_double(
                "performance",
                "annualization",
                TRADING_DAYS_PER_YEAR,
            )?,
        },
    })
}

fn interval(config: &dyn ConfigPort) -> Result<Interval, TrendscopeError> {
    match config.get_string("data", "interval") {
        Some(s) => s
            .parse::<Interval>()
            .map_err(|reason| TrendscopeError::ConfigInvalid {
                section: "data".into(),
                key: "interval".into(),
                reason,
            }),
        None => Ok(Interval::Daily),
    }
}

pub fn build_request(config: &dyn ConfigPort) -> Result<AnalysisRequest, TrendscopeError> {
    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    let interval = interval(config)?;
    let benchmark = config
        .get_string("data", "benchmark")
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    Ok(AnalysisRequest {
        start_date,
        end_date,
        interval,
        benchmark,
    })
}

pub fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(s) = symbol_override {
        let s = s.trim();
        if !s.is_empty() {
            return vec![s.to_string()];
        }
    }
    config.get_list("data", "symbols")
}

fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, TrendscopeError> {
    config
        .get_string("data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| TrendscopeError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })
}

/// Every chart for one analysed symbol; returns the written paths.
///
/// Year-limited charts are skipped when the series has no bars in the
/// requested years.
pub fn render_charts(
    chart_port: &dyn ChartPort,
    report: &SymbolReport,
    options: &ChartOptions,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, TrendscopeError> {
    let perf = &report.performance;
    let prices = &report.prices;
    let mut charts = vec![
        view_sma_chart(prices, &report.indicators),
        profits_chart(&perf.returns, &perf.cumulative),
        drawdown_chart(&perf.drawdown),
        support_resistance_chart(prices, &report.indicators),
    ];
    let optional = [
        signals_chart(
            prices,
            &report.indicators,
            &report.positions,
            options.signals_year,
        ),
        options
            .compare_years
            .and_then(|(a, b)| compare_years_chart(prices, a, b)),
        options
            .compare_years
            .zip(options.compare_month)
            .and_then(|((a, b), m)| compare_month_chart(prices, a, b, m)),
    ];
    charts.extend(optional.into_iter().flatten());

    charts
        .iter()
        .map(|chart| chart_port.render(chart, &report.symbol, output_dir))
        .collect()
}

/// Analyse `symbols`, print a report per symbol and render charts when a
/// chart port is given.
///
/// Succeeds when at least one symbol was analysed; otherwise exits with the
/// first symbol's error class.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    chart_port: Option<(&dyn ChartPort, &ChartOptions)>,
    symbols: &[String],
    request: &AnalysisRequest,
    params: &PipelineParams,
    output_dir: &Path,
) -> ExitCode {
    eprintln!(
        "Analysing {} symbols, {} to {} ({}, {})",
        symbols.len(),
        request.start_date,
        request.end_date,
        request.interval,
        params.signal.strategy,
    );

    let results = run_universe(data_port, symbols, request, params);
    let mut first_error: Option<ExitCode> = None;
    let mut analysed = 0;

    for (symbol, result) in &results {
        match result {
            Ok(report) => {
                analysed += 1;
                println!("{}", format_report(report));
                if let Some((port, options)) = chart_port {
                    match render_charts(port, report, options, output_dir) {
                        Ok(paths) => {
                            eprintln!("  {} charts written for {}", paths.len(), symbol)
                        }
                        Err(e) => {
                            warn!(symbol = %symbol, stage = "charts", "{e}");
                            eprintln!("warning: charts for {} failed ({})", symbol, e);
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                first_error.get_or_insert_with(|| e.into());
            }
        }
    }

    eprintln!("\n{} of {} symbols analysed", analysed, results.len());
    match (analysed, first_error) {
        (0, Some(code)) => code,
        _ => ExitCode::SUCCESS,
    }
}

fn run_analysis(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    output_override: Option<&PathBuf>,
    no_charts: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let setup = build_params(&adapter).and_then(|params| {
        let request = build_request(&adapter)?;
        let dir = data_dir(&adapter)?;
        let options = parse_chart_options(&adapter)?;
        let charts = !no_charts && adapter.get_bool("output", "charts", true)?;
        let clear = adapter.get_bool("output", "clear", false)?;
        Ok((params, request, dir, options, charts, clear))
    });
    let (params, request, dir, options, charts, clear) = match setup {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = resolve_symbols(symbol_override, &adapter);
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }

    let output_dir = output_override.cloned().unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("output", "dir")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        )
    });
    if charts {
        if let Err(e) = prepare_output_dir(&output_dir, clear) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    let data_port = CsvAdapter::new(dir);
    let chart_port = SvgChartAdapter::new();
    run_pipeline(
        &data_port,
        charts.then_some((&chart_port as &dyn ChartPort, &options)),
        &symbols,
        &request,
        &params,
        &output_dir,
    )
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (params, request, options) = match build_params(&adapter).and_then(|params| {
        let request = build_request(&adapter)?;
        Ok((params, request, parse_chart_options(&adapter)?))
    }) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ind = &params.indicators;
    eprintln!("\nData:");
    eprintln!("  Symbols:      {}", resolve_symbols(None, &adapter).join(", "));
    eprintln!(
        "  Benchmark:    {}",
        request.benchmark.as_deref().unwrap_or("none")
    );
    eprintln!(
        "  Range:        {} to {} ({})",
        request.start_date, request.end_date, request.interval
    );
    eprintln!("\nIndicators:");
    eprintln!(
        "  SMA:          {} / {}",
        ind.fast_window, ind.slow_window
    );
    eprintln!("  RSI:          {}", ind.rsi_window);
    eprintln!("  Volatility:   {}", ind.volatility_window);
    eprintln!("  Support run:  {}", ind.support_run);
    eprintln!("  Stop loss:    {:.1} %", ind.stop_loss_pct * 100.0);
    eprintln!("  Warmup:       {} bars", ind.warmup());
    eprintln!("\nSignal:");
    eprintln!("  Strategy:     {}", params.signal.strategy);
    if params.signal.strategy == StrategyKind::Breakout {
        eprintln!("  Margin:       {:.2} %", params.signal.breakout_margin * 100.0);
    }
    if params.signal.strategy.holds_for_duration() {
        eprintln!("  Duration:     {} bars", params.signal.duration);
        eprintln!("  Spread:       {}", params.signal.spread);
    }
    eprintln!("  Annualization: {}", params.performance.annualization);
    eprintln!("\nCharts:");
    if let Some(year) = options.signals_year {
        eprintln!("  Signals year: {}", year);
    }
    if let Some((a, b)) = options.compare_years {
        match options.compare_month {
            Some(m) => eprintln!("  Compare:      {} vs {} (and month {:02})", a, b, m),
            None => eprintln!("  Compare:      {} vs {}", a, b),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let listed = data_dir(&config).and_then(|dir| {
        let interval = interval(&config)?;
        CsvAdapter::new(dir).list_symbols(interval)
    });
    let symbols = match listed {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
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
