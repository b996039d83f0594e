#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;
use trendscope::domain::error::TrendscopeError;
pub use trendscope::domain::ohlcv::{Interval, PriceBar, PriceSeries};
use trendscope::domain::params::{IndicatorParams, PipelineParams, SignalParams, StrategyKind};
use trendscope::domain::pipeline::AnalysisRequest;
use trendscope::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub fetched: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetched: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _interval: Interval,
    ) -> Result<PriceSeries, TrendscopeError> {
        self.fetched.borrow_mut().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendscopeError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let bars: Vec<PriceBar> = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| {
                        let d = b.timestamp.date();
                        d >= start_date && d <= end_date
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(TrendscopeError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self, _interval: Interval) -> Result<Vec<String>, TrendscopeError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        timestamp: NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// Daily bars from `start_date`, one per close.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: (start + Duration::days(i as i64)).and_hms_opt(0, 0, 0).unwrap(),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000,
        })
        .collect()
}

/// A smooth oscillating price path around `base`.
pub fn wave(count: usize, base: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + amplitude * (i as f64 * 0.3).sin() + i as f64 * 0.05)
        .collect()
}

pub fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, bars_from_closes("2024-01-01", closes)).unwrap()
}

pub fn small_params(strategy: StrategyKind) -> PipelineParams {
    PipelineParams {
        indicators: IndicatorParams {
            fast_window: 3,
            slow_window: 6,
            rsi_window: 4,
            volatility_window: 5,
            support_run: 3,
            stop_loss_pct: 0.02,
        },
        signal: SignalParams {
            strategy,
            duration: 2,
            ..SignalParams::default()
        },
        ..PipelineParams::default()
    }
}

pub fn sample_request(benchmark: Option<&str>) -> AnalysisRequest {
    AnalysisRequest {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        interval: Interval::Daily,
        benchmark: benchmark.map(str::to_string),
    }
}
