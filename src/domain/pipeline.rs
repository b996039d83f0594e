//! Per-symbol analysis pipeline: fetch → indicators → signal → performance.
//!
//! Each symbol runs independently. A failure is logged with its symbol and
//! stage and returned for that symbol only; the universe loop moves on.

use crate::domain::error::TrendscopeError;
use crate::domain::indicator::{IndicatorSet, compute_indicators};
use crate::domain::ohlcv::{Interval, PriceSeries};
use crate::domain::params::PipelineParams;
use crate::domain::performance::{
    PerformanceReport, ReturnSeries, compute_returns, holding_returns,
};
use crate::domain::signal::{Signal, compute_signal};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Minimum bars for a single return to exist.
pub const MIN_BARS: usize = 2;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: Interval,
    pub benchmark: Option<String>,
}

#[derive(Debug)]
pub struct SymbolReport {
    pub symbol: String,
    pub prices: PriceSeries,
    pub indicators: IndicatorSet,
    pub positions: Vec<Option<Signal>>,
    pub performance: PerformanceReport,
}

fn at_stage<T>(
    symbol: &str,
    stage: &str,
    result: Result<T, TrendscopeError>,
) -> Result<T, TrendscopeError> {
    result.inspect_err(|e| warn!(symbol, stage, "{e}"))
}

/// Run every stage after ingestion on an already-fetched series.
pub fn analyze_series(
    prices: PriceSeries,
    benchmark: Option<&ReturnSeries>,
    params: &PipelineParams,
) -> Result<SymbolReport, TrendscopeError> {
    let symbol = prices.symbol().to_string();

    if prices.is_empty() {
        return at_stage(
            &symbol,
            "ingestion",
            Err(TrendscopeError::DataUnavailable {
                symbol: symbol.clone(),
            }),
        );
    }
    if prices.len() < MIN_BARS {
        return at_stage(
            &symbol,
            "ingestion",
            Err(TrendscopeError::InsufficientHistory {
                symbol: symbol.clone(),
                bars: prices.len(),
                minimum: MIN_BARS,
            }),
        );
    }
    if prices.len() < params.indicators.warmup() {
        info!(
            symbol = %symbol,
            bars = prices.len(),
            warmup = params.indicators.warmup(),
            "series shorter than indicator warmup; signals stay undefined"
        );
    }

    let indicators = at_stage(
        &symbol,
        "indicators",
        compute_indicators(&prices, &params.indicators),
    )?;
    let positions = at_stage(
        &symbol,
        "signal",
        compute_signal(&prices, &indicators, &params.signal),
    )?;
    let returns = at_stage(
        &symbol,
        "performance",
        if params.signal.strategy.holds_for_duration() {
            holding_returns(
                &prices,
                &positions,
                params.signal.duration,
                params.signal.spread,
            )
        } else {
            compute_returns(&prices, &positions)
        },
    )?;

    let performance =
        PerformanceReport::compute(returns, benchmark, params.performance.annualization);
    info!(
        symbol = %symbol,
        bars = prices.len(),
        total_return = performance.total_return,
        max_drawdown = performance.max_drawdown,
        "analysis complete"
    );

    Ok(SymbolReport {
        symbol,
        prices,
        indicators,
        positions,
        performance,
    })
}

/// Buy-and-hold returns of the benchmark, or `None` when it cannot be fetched.
pub fn fetch_benchmark(data_port: &dyn DataPort, request: &AnalysisRequest) -> Option<ReturnSeries> {
    let symbol = request.benchmark.as_deref()?;
    match data_port.fetch_bars(symbol, request.start_date, request.end_date, request.interval) {
        Ok(series) => Some(ReturnSeries::buy_and_hold(&series)),
        Err(e) => {
            warn!(symbol, stage = "benchmark", "{e}");
            None
        }
    }
}

pub fn run_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    request: &AnalysisRequest,
    benchmark: Option<&ReturnSeries>,
    params: &PipelineParams,
) -> Result<SymbolReport, TrendscopeError> {
    info!(
        symbol,
        start = %request.start_date,
        end = %request.end_date,
        interval = %request.interval,
        "fetching bars"
    );
    let prices = at_stage(
        symbol,
        "ingestion",
        data_port.fetch_bars(symbol, request.start_date, request.end_date, request.interval),
    )?;
    analyze_series(prices, benchmark, params)
}

/// Analyse each symbol in order; one symbol's failure never stops the rest.
pub fn run_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    request: &AnalysisRequest,
    params: &PipelineParams,
) -> Vec<(String, Result<SymbolReport, TrendscopeError>)> {
    let benchmark = fetch_benchmark(data_port, request);
    symbols
        .iter()
        .map(|symbol| {
            let result = run_symbol(data_port, symbol, request, benchmark.as_ref(), params);
            (symbol.clone(), result)
        })
        .collect()
}
